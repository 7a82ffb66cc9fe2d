use crate::channels::types::HasChannel;
use crate::tools::registry::Tool;
use crate::tools::types::{
    PropertySchema, ToolContext, ToolDefinition, ToolGroup, ToolInputSchema, ToolResult,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Posts a message in the channel the agent was invoked from
pub struct SendMessageTool {
    definition: ToolDefinition,
}

impl SendMessageTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "content".to_string(),
            PropertySchema::string("The message content to send"),
        );

        SendMessageTool {
            definition: ToolDefinition {
                name: "send_message".to_string(),
                description: "Send a message to a Discord channel. Input should be the message content as a string. Use this tool to respond to users or send information to the current channel.".to_string(),
                input_schema: ToolInputSchema {
                    schema_type: "object".to_string(),
                    properties,
                    required: vec!["content".to_string()],
                },
                group: ToolGroup::Messaging,
            },
        }
    }
}

impl Default for SendMessageTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct SendMessageParams {
    content: String,
}

#[async_trait]
impl Tool for SendMessageTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: SendMessageParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        let Some((invocation, discord)) = context.bound() else {
            return ToolResult::error("Error: No valid Discord context available to send message");
        };

        match discord
            .send_message(invocation.channel_id(), &params.content)
            .await
        {
            Ok(()) => ToolResult::success(format!("Message sent successfully: {}", params.content)),
            Err(e) => ToolResult::error(format!("Error sending message: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::types::{CommandContext, InvocationContext};
    use crate::test_support::FakeDiscord;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    fn command_context(discord: Arc<FakeDiscord>) -> ToolContext {
        ToolContext::new()
            .with_invocation(InvocationContext::Command(CommandContext {
                channel_id: 9,
                guild_id: Some(1),
                author_id: 2,
                message_id: None,
            }))
            .with_discord(discord)
    }

    #[tokio::test]
    async fn test_no_context() {
        let result = SendMessageTool::new()
            .execute(json!({"content": "hi"}), &ToolContext::new())
            .await;
        assert!(!result.success);
        assert_eq!(
            result.content,
            "Error: No valid Discord context available to send message"
        );
    }

    #[tokio::test]
    async fn test_sends_to_invocation_channel() {
        let discord = Arc::new(FakeDiscord::new());
        let result = SendMessageTool::new()
            .execute(json!({"content": "hello"}), &command_context(discord.clone()))
            .await;
        assert!(result.success);
        assert_eq!(result.content, "Message sent successfully: hello");
        assert_eq!(discord.sent.lock().clone(), vec![(9, "hello".to_string())]);
    }

    #[tokio::test]
    async fn test_platform_failure_is_reported() {
        let discord = Arc::new(FakeDiscord::new());
        discord.fail_sends.store(true, Ordering::SeqCst);
        let result = SendMessageTool::new()
            .execute(json!({"content": "hello"}), &command_context(discord))
            .await;
        assert!(!result.success);
        assert_eq!(result.content, "Error sending message: Missing Permissions");
    }

    #[tokio::test]
    async fn test_missing_content() {
        let result = SendMessageTool::new()
            .execute(json!({}), &ToolContext::new())
            .await;
        assert!(result.content.starts_with("Invalid parameters"));
    }
}
