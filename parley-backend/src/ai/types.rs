use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// One completion from the model
#[derive(Debug, Clone, Default)]
pub struct AiResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

impl AiResponse {
    pub fn text(content: impl Into<String>) -> Self {
        AiResponse {
            content: content.into(),
            tool_calls: vec![],
        }
    }

    pub fn tool_use(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        AiResponse {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn is_tool_use(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// JSON schema a structured completion must conform to
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: Value,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Transport(String),
    #[error("LLM API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Failed to parse LLM response: {0}")]
    Parse(String),
    #[error("LLM returned no choices")]
    EmptyResponse,
    #[error("LLM client misconfigured: {0}")]
    Config(String),
}

impl LlmError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Transport(msg) => crate::tools::http_retry::is_retryable_error(msg),
            LlmError::Api { status, .. } => crate::tools::http_retry::is_retryable_status(*status),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(LlmError::Api { status: 503, message: "busy".into() }.is_retryable());
        assert!(LlmError::Api { status: 429, message: "slow down".into() }.is_retryable());
        assert!(!LlmError::Api { status: 400, message: "bad".into() }.is_retryable());
        assert!(LlmError::Transport("operation timed out".into()).is_retryable());
        assert!(!LlmError::Parse("eof".into()).is_retryable());
    }
}
