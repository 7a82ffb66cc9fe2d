use super::identifiers::{parse_user_identifier, UserLookup};
use crate::channels::discord_api::{MemberInfo, PlatformError};
use crate::channels::types::HasGuild;
use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolContext, ToolDefinition, ToolGroup, ToolInputSchema, ToolResult,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

pub struct GetUserInfoTool {
    definition: ToolDefinition,
}

impl GetUserInfoTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "user_identifier".to_string(),
            PropertySchema::string("A user mention (<@id>), user ID, username or display name"),
        );

        GetUserInfoTool {
            definition: ToolDefinition {
                name: "get_user_info".to_string(),
                description: "Get information about a Discord user. Input should be a user mention (@user), user ID, or username.".to_string(),
                input_schema: ToolInputSchema {
                    schema_type: "object".to_string(),
                    properties,
                    required: vec!["user_identifier".to_string()],
                },
                group: ToolGroup::Lookup,
            },
        }
    }
}

impl Default for GetUserInfoTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct UserInfoParams {
    user_identifier: String,
}

pub(crate) fn format_user_info(member: &MemberInfo) -> String {
    let mut info = String::from("**User Information:**\n");
    info.push_str(&format!("• Username: {}\n", member.username));
    if let Some(discriminator) = member.discriminator {
        info.push_str(&format!("• Discriminator: #{:04}\n", discriminator));
    }
    info.push_str(&format!("• Display Name: {}\n", member.display_name));
    info.push_str(&format!("• ID: {}\n", member.id));
    info.push_str(&format!("• Bot: {}\n", member.bot));
    info.push_str(&format!("• Account Created: {}\n", member.created_at));
    info.push_str(&format!(
        "• Joined Server: {}\n",
        member.joined_at.as_deref().unwrap_or("Unknown")
    ));
    info.push_str(&format!(
        "• Top Role: {}",
        member.roles.first().map(String::as_str).unwrap_or("No roles")
    ));
    if !member.roles.is_empty() {
        info.push_str(&format!("\n• Roles: {}", member.roles.join(", ")));
    }
    info
}

#[async_trait]
impl Tool for GetUserInfoTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: UserInfoParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        let Some((invocation, discord)) = context.bound() else {
            return ToolResult::error("Error: No guild context available");
        };
        let Some(guild_id) = invocation.guild_id() else {
            return ToolResult::error("Error: No guild context available");
        };

        let found = match parse_user_identifier(&params.user_identifier) {
            UserLookup::Id(user_id) => match discord.member(guild_id, user_id).await {
                Ok(member) => Ok(Some(member)),
                Err(PlatformError::NotFound(_)) => Ok(None),
                Err(e) => Err(e),
            },
            UserLookup::Name(name) => discord.find_member(guild_id, &name).await,
        };

        match found {
            Ok(Some(member)) => ToolResult::success(format_user_info(&member)),
            Ok(None) => ToolResult::error(format!(
                "Error: Could not find user '{}'",
                params.user_identifier
            )),
            Err(e) => ToolResult::error(format!("Error getting user info: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::types::{InvocationContext, MessageContext};
    use crate::test_support::{member_info, FakeDiscord};
    use serde_json::json;
    use std::sync::Arc;

    fn context(guild_id: Option<u64>) -> ToolContext {
        let discord = FakeDiscord::new().with_member(1, member_info(123, "alice", "Ally"));
        ToolContext::new()
            .with_invocation(InvocationContext::Message(MessageContext {
                message_id: 9,
                channel_id: 8,
                guild_id,
                author_id: 7,
            }))
            .with_discord(Arc::new(discord))
    }

    async fn lookup(identifier: &str, context: &ToolContext) -> ToolResult {
        GetUserInfoTool::new()
            .execute(json!({ "user_identifier": identifier }), context)
            .await
    }

    #[tokio::test]
    async fn test_id_forms_resolve_to_same_member() {
        let ctx = context(Some(1));
        let by_mention = lookup("<@123>", &ctx).await;
        let by_nick_mention = lookup("<@!123>", &ctx).await;
        let by_id = lookup("123", &ctx).await;
        assert!(by_mention.success);
        assert_eq!(by_mention.content, by_nick_mention.content);
        assert_eq!(by_mention.content, by_id.content);
        assert!(by_id.content.contains("• Username: alice"));
    }

    #[tokio::test]
    async fn test_name_then_display_name() {
        let ctx = context(Some(1));
        assert!(lookup("alice", &ctx).await.content.contains("• ID: 123"));
        assert!(lookup("Ally", &ctx).await.content.contains("• ID: 123"));
    }

    #[tokio::test]
    async fn test_not_found() {
        let ctx = context(Some(1));
        assert_eq!(
            lookup("bob", &ctx).await.content,
            "Error: Could not find user 'bob'"
        );
        assert_eq!(
            lookup("<@999>", &ctx).await.content,
            "Error: Could not find user '<@999>'"
        );
    }

    #[tokio::test]
    async fn test_requires_guild() {
        assert_eq!(
            lookup("alice", &context(None)).await.content,
            "Error: No guild context available"
        );
        assert_eq!(
            lookup("alice", &ToolContext::new()).await.content,
            "Error: No guild context available"
        );
    }

    #[test]
    fn test_format_roles() {
        let text = format_user_info(&member_info(1, "a", "A"));
        assert!(text.contains("• Top Role: Mod"));
        assert!(text.ends_with("• Roles: Mod, Member"));
        assert!(!text.contains("Discriminator"));
    }
}
