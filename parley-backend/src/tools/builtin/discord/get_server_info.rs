use crate::channels::discord_api::GuildInfo;
use crate::channels::types::HasGuild;
use crate::tools::registry::Tool;
use crate::tools::types::{ToolContext, ToolDefinition, ToolGroup, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde_json::Value;

const NO_GUILD: &str = "Error: No guild context available (this might be a DM)";

pub struct GetServerInfoTool {
    definition: ToolDefinition,
}

impl GetServerInfoTool {
    pub fn new() -> Self {
        GetServerInfoTool {
            definition: ToolDefinition {
                name: "get_server_info".to_string(),
                description: "Get information about the current Discord server/guild. No input required - gets info about the current server.".to_string(),
                input_schema: ToolInputSchema::default(),
                group: ToolGroup::Lookup,
            },
        }
    }
}

impl Default for GetServerInfoTool {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn format_server_info(guild: &GuildInfo) -> String {
    let or_unknown = |n: Option<u64>| n.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string());
    format!(
        "**Server Information:**\n\
         • Name: {}\n\
         • ID: {}\n\
         • Description: {}\n\
         • Owner: {}\n\
         • Created: {}\n\
         • Members: {} ({} online)\n\
         • Humans: {} | Bots: {}\n\
         • Text Channels: {}\n\
         • Voice Channels: {}\n\
         • Categories: {}\n\
         • Roles: {}\n\
         • Emojis: {}\n\
         • Boost Level: {} ({} boosts)\n\
         • Verification Level: {}",
        guild.name,
        guild.id,
        guild.description.as_deref().unwrap_or("No description"),
        guild.owner_name.as_deref().unwrap_or("Unknown"),
        guild.created_at,
        or_unknown(guild.member_count),
        or_unknown(guild.online_members),
        guild.human_members,
        guild.bot_members,
        guild.text_channels,
        guild.voice_channels,
        guild.categories,
        guild.roles,
        guild.emojis,
        guild.boost_level,
        guild.boosts,
        guild.verification_level,
    )
}

#[async_trait]
impl Tool for GetServerInfoTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, _params: Value, context: &ToolContext) -> ToolResult {
        let Some((invocation, discord)) = context.bound() else {
            return ToolResult::error(NO_GUILD);
        };
        let Some(guild_id) = invocation.guild_id() else {
            return ToolResult::error(NO_GUILD);
        };

        match discord.guild(guild_id).await {
            Ok(guild) => ToolResult::success(format_server_info(&guild)),
            Err(e) => ToolResult::error(format!("Error getting server info: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::types::{InvocationContext, MessageContext};
    use crate::test_support::{guild_info, FakeDiscord};
    use serde_json::json;
    use std::sync::Arc;

    fn context(guild_id: Option<u64>) -> ToolContext {
        ToolContext::new()
            .with_invocation(InvocationContext::Message(MessageContext {
                message_id: 1,
                channel_id: 2,
                guild_id,
                author_id: 3,
            }))
            .with_discord(Arc::new(FakeDiscord::new().with_guild(guild_info(5, "Parley HQ", 3))))
    }

    #[tokio::test]
    async fn test_server_summary() {
        let result = GetServerInfoTool::new().execute(json!({}), &context(Some(5))).await;
        assert!(result.success);
        assert!(result.content.starts_with("**Server Information:**\n• Name: Parley HQ"));
        assert!(result.content.contains("• Members: 12 (4 online)"));
        assert!(result.content.contains("• Humans: 10 | Bots: 2"));
        assert!(result.content.ends_with("• Verification Level: low"));
    }

    #[tokio::test]
    async fn test_dm_has_no_guild() {
        let result = GetServerInfoTool::new().execute(json!({}), &context(None)).await;
        assert_eq!(result.content, NO_GUILD);

        let result = GetServerInfoTool::new()
            .execute(Value::Null, &ToolContext::new())
            .await;
        assert_eq!(result.content, NO_GUILD);
    }
}
