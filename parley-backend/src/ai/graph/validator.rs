use crate::ai::graph::types::{Approval, ValidationError, ValidationRequest, ValidationVerdict};
use crate::ai::{ChatModel, Message, ResponseSchema};
use serde_json::json;
use std::sync::Arc;

const VALIDATE_PROMPT: &str = include_str!("prompts/validate.md");

/// Gatekeeper stage: one structured call deciding whether a request may run
pub struct Validator {
    llm: Arc<dyn ChatModel>,
}

impl Validator {
    pub fn new(llm: Arc<dyn ChatModel>) -> Self {
        Self { llm }
    }

    pub fn render_prompt(request: &ValidationRequest) -> String {
        VALIDATE_PROMPT.replace("{user_request}", &request.user_request)
    }

    pub fn verdict_schema() -> ResponseSchema {
        ResponseSchema {
            name: "validation_result".to_string(),
            schema: json!({
                "type": "object",
                "properties": {
                    "is_valid": { "type": "boolean" },
                    "reason": { "type": ["string", "null"] }
                },
                "required": ["is_valid", "reason"]
            }),
        }
    }

    pub async fn validate(&self, request: &ValidationRequest) -> Result<Approval, ValidationError> {
        let messages = [Message::user(Self::render_prompt(request))];
        let value = self
            .llm
            .generate_structured(&messages, &Self::verdict_schema())
            .await?;
        log::info!("[GRAPH] Validation result: {}", value);

        let verdict: ValidationVerdict = serde_json::from_value(value)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        Ok(verdict.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_request() {
        let prompt = Validator::render_prompt(&ValidationRequest {
            user_request: "react with a thumbs up".to_string(),
        });
        assert!(prompt.starts_with("You are an expert at determining and rejecting requests"));
        assert!(prompt.ends_with("suitable to be validated or not react with a thumbs up"));
    }

    #[test]
    fn test_schema_requires_verdict() {
        let schema = Validator::verdict_schema();
        assert_eq!(schema.schema["properties"]["is_valid"]["type"], "boolean");
        assert_eq!(schema.schema["required"][0], "is_valid");
    }
}
