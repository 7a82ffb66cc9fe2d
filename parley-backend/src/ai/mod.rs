pub mod factory;
pub mod graph;
pub mod openai;
pub mod types;

pub use openai::OpenAIClient;
pub use types::{AiResponse, LlmError, ResponseSchema, ToolCall};

use crate::config::LlmConfig;
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// One entry of an agent conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    /// Calls requested by an assistant turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Set on tool results, pointing at the call they answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn plain(role: MessageRole, content: impl Into<String>) -> Self {
        Message {
            role,
            content: content.into(),
            tool_calls: vec![],
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(MessageRole::Assistant, content)
    }

    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Message {
            tool_calls,
            ..Self::plain(MessageRole::Assistant, content)
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::plain(MessageRole::Tool, content)
        }
    }
}

/// A chat model the agent graph can drive.
///
/// One handle is shared by every agent in the process; implementations must be
/// stateless between calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Free-form completion, optionally offering tools
    async fn generate_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<AiResponse, LlmError>;

    /// Completion constrained to `schema`, returned as parsed JSON
    async fn generate_structured(
        &self,
        messages: &[Message],
        schema: &ResponseSchema,
    ) -> Result<Value, LlmError>;
}

/// Build the process-wide chat model handle
pub fn create_llm(config: &LlmConfig) -> Result<Arc<dyn ChatModel>, LlmError> {
    let client = OpenAIClient::new(config)?;
    log::info!(
        "[AI] Using model {} at {} (temperature {}, {} retries)",
        config.model,
        config.endpoint,
        config.temperature,
        config.max_retries
    );
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_strings() {
        assert_eq!(MessageRole::Assistant.to_string(), "assistant");
        assert_eq!(MessageRole::Tool.as_ref(), "tool");
    }

    #[test]
    fn test_tool_message_links_call() {
        let msg = Message::tool("call_1", "done");
        assert_eq!(msg.role, MessageRole::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
        assert!(msg.tool_calls.is_empty());
    }
}
