use super::identifiers::{parse_channel_identifier, ChannelLookup};
use crate::channels::discord_api::{ChannelInfo, PlatformError};
use crate::channels::types::{HasChannel, HasGuild};
use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolContext, ToolDefinition, ToolGroup, ToolInputSchema, ToolResult,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

const NOT_FOUND: &str = "Error: Could not find the specified channel";

pub struct GetChannelInfoTool {
    definition: ToolDefinition,
}

impl GetChannelInfoTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "channel_identifier".to_string(),
            PropertySchema::string(
                "Channel ID, #mention or name. Leave empty for the current channel.",
            )
            .with_default(json!("")),
        );

        GetChannelInfoTool {
            definition: ToolDefinition {
                name: "get_channel_info".to_string(),
                description: "Get information about the current Discord channel or a specific channel. Input should be either empty for current channel or a channel ID/name.".to_string(),
                input_schema: ToolInputSchema {
                    schema_type: "object".to_string(),
                    properties,
                    required: vec![],
                },
                group: ToolGroup::Lookup,
            },
        }
    }
}

impl Default for GetChannelInfoTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ChannelInfoParams {
    #[serde(default)]
    channel_identifier: Option<String>,
}

pub(crate) fn format_channel_info(channel: &ChannelInfo) -> String {
    format!(
        "**Channel Information:**\n\
         • Name: #{}\n\
         • ID: {}\n\
         • Type: {}\n\
         • Category: {}\n\
         • Topic: {}\n\
         • NSFW: {}\n\
         • Members: {}",
        channel.name,
        channel.id,
        channel.kind,
        channel.category.as_deref().unwrap_or("No category"),
        channel
            .topic
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("No topic"),
        channel.nsfw,
        channel
            .member_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "N/A".to_string()),
    )
}

#[async_trait]
impl Tool for GetChannelInfoTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        // The model sometimes sends no arguments at all for the current channel
        let params: ChannelInfoParams = if params.is_null() {
            ChannelInfoParams::default()
        } else {
            match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
            }
        };

        let Some((invocation, discord)) = context.bound() else {
            return ToolResult::error(NOT_FOUND);
        };

        let lookup = parse_channel_identifier(params.channel_identifier.as_deref().unwrap_or(""));
        let found = match lookup {
            ChannelLookup::Current => discord.channel(invocation.channel_id()).await.map(Some),
            ChannelLookup::Id(id) => match invocation.guild_id() {
                Some(guild_id) => discord
                    .guild_channels(guild_id)
                    .await
                    .map(|channels| channels.into_iter().find(|c| c.id == id)),
                None => Ok(None),
            },
            ChannelLookup::Name(name) => match invocation.guild_id() {
                Some(guild_id) => discord
                    .guild_channels(guild_id)
                    .await
                    .map(|channels| channels.into_iter().find(|c| c.name == name)),
                None => Ok(None),
            },
        };

        match found {
            Ok(Some(channel)) => ToolResult::success(format_channel_info(&channel)),
            Ok(None) | Err(PlatformError::NotFound(_)) => ToolResult::error(NOT_FOUND),
            Err(e) => ToolResult::error(format!("Error getting channel info: {}", e)),
        }
    }
}
