use super::identifiers::{parse_message_id, parse_reaction_input};
use crate::channels::discord_api::PlatformError;
use crate::channels::types::{HasChannel, HasMessage};
use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolContext, ToolDefinition, ToolGroup, ToolInputSchema, ToolResult,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

pub struct ReactToMessageTool {
    definition: ToolDefinition,
}

impl ReactToMessageTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "reaction_input".to_string(),
            PropertySchema::string(
                "Either 'emoji' to react to the current message, or 'emoji:message_id'. Example: '👍' or '👍:1234567890123456789'",
            ),
        );

        ReactToMessageTool {
            definition: ToolDefinition {
                name: "react_to_message".to_string(),
                description: "Add a reaction emoji to a message. Input should be in the format 'emoji:message_id' or just 'emoji' to react to the current message.".to_string(),
                input_schema: ToolInputSchema {
                    schema_type: "object".to_string(),
                    properties,
                    required: vec!["reaction_input".to_string()],
                },
                group: ToolGroup::Messaging,
            },
        }
    }
}

impl Default for ReactToMessageTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ReactParams {
    reaction_input: String,
}

#[async_trait]
impl Tool for ReactToMessageTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: ReactParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        let target = parse_reaction_input(&params.reaction_input);
        let emoji = target.emoji;

        let explicit_id = match target.message_id.as_deref() {
            Some(raw) => match parse_message_id(raw) {
                Some(id) => Some((raw.to_string(), id)),
                None => return ToolResult::error(format!("Error: Invalid message ID '{}'", raw)),
            },
            None => None,
        };

        let Some((invocation, discord)) = context.bound() else {
            return match explicit_id {
                Some(_) => ToolResult::error("Error: No channel context to fetch message"),
                None => ToolResult::error("Error: No message context available"),
            };
        };
        let channel_id = invocation.channel_id();

        let message_id = match explicit_id {
            Some((raw, id)) => match discord.ensure_message(channel_id, id).await {
                Ok(()) => id,
                Err(PlatformError::NotFound(_)) => {
                    return ToolResult::error(format!("Error: Message with ID {} not found", raw));
                }
                Err(e) => return ToolResult::error(format!("Error adding reaction: {}", e)),
            },
            // The message that triggered the bot
            None => match invocation.message_id() {
                Some(id) => id,
                None => return ToolResult::error("Error: No message context available"),
            },
        };

        match discord.add_reaction(channel_id, message_id, &emoji).await {
            Ok(()) => ToolResult::success(format!("Successfully reacted with {} to message", emoji)),
            Err(PlatformError::UnknownEmoji) => {
                ToolResult::error(format!("Error: '{}' is not a valid emoji", emoji))
            }
            Err(e) => ToolResult::error(format!("Error adding reaction: {}", e)),
        }
    }
}
