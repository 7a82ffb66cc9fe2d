use crate::ai::types::{AiResponse, LlmError, ResponseSchema, ToolCall};
use crate::ai::{ChatModel, Message};
use crate::config::LlmConfig;
use crate::tools::http_retry::{backoff_delay, is_reqwest_error_retryable};
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Client for any OpenAI-compatible chat completions endpoint (Gemini by default)
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_retries: u32,
}

#[derive(Debug, Serialize)]
struct OpenAICompletionRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAIFunction,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: OpenAIFunctionCall,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIFunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAICompletionResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

impl OpenAIClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        if !config.api_key.is_empty() {
            let auth_value = header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| LlmError::Config(format!("Invalid API key format: {}", e)))?;
            headers.insert(header::AUTHORIZATION, auth_value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    fn to_openai_message(message: &Message) -> OpenAIMessage {
        let tool_calls = if message.tool_calls.is_empty() {
            None
        } else {
            Some(
                message
                    .tool_calls
                    .iter()
                    .map(|tc| OpenAIToolCall {
                        id: tc.id.clone(),
                        call_type: "function".to_string(),
                        function: OpenAIFunctionCall {
                            name: tc.name.clone(),
                            arguments: tc.arguments.to_string(),
                        },
                    })
                    .collect(),
            )
        };

        OpenAIMessage {
            role: message.role.to_string(),
            // Some providers require the content field even when empty
            content: Some(message.content.clone()),
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
        }
    }

    fn build_request(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        response_format: Option<Value>,
    ) -> OpenAICompletionRequest {
        let openai_tools: Option<Vec<OpenAITool>> = if tools.is_empty() {
            None
        } else {
            Some(
                tools
                    .iter()
                    .map(|t| OpenAITool {
                        tool_type: "function".to_string(),
                        function: OpenAIFunction {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.input_schema.to_json(),
                        },
                    })
                    .collect(),
            )
        };

        OpenAICompletionRequest {
            model: self.model.clone(),
            messages: messages.iter().map(Self::to_openai_message).collect(),
            temperature: self.temperature,
            tool_choice: openai_tools.as_ref().map(|_| "auto".to_string()),
            tools: openai_tools,
            response_format,
        }
    }

    fn parse_completion(response_text: &str) -> Result<AiResponse, LlmError> {
        let response_data: OpenAICompletionResponse = serde_json::from_str(response_text)
            .map_err(|e| LlmError::Parse(format!("{} - body: {}", e, response_text)))?;

        let choice = response_data
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;

        log::info!(
            "[OPENAI] Response - content_len: {}, tool_calls: {}, finish_reason: {:?}",
            choice.message.content.as_ref().map(|c| c.len()).unwrap_or(0),
            choice.message.tool_calls.as_ref().map(|t| t.len()).unwrap_or(0),
            choice.finish_reason
        );

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                arguments: serde_json::from_str(&tc.function.arguments).unwrap_or(json!({})),
                id: tc.id,
                name: tc.function.name,
            })
            .collect();

        let content = choice.message.content.unwrap_or_default();
        if tool_calls.is_empty() {
            Ok(AiResponse::text(content))
        } else {
            Ok(AiResponse::tool_use(content, tool_calls))
        }
    }

    /// Pull a JSON object out of a structured completion, tolerating code fences
    fn parse_structured(content: &str) -> Result<Value, LlmError> {
        let trimmed = content.trim();
        let body = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .and_then(|rest| rest.strip_suffix("```"))
            .unwrap_or(trimmed)
            .trim();
        serde_json::from_str(body)
            .map_err(|e| LlmError::Parse(format!("structured output is not JSON: {} - {}", e, body)))
    }

    async fn send_once(&self, request: &OpenAICompletionRequest) -> Result<AiResponse, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if is_reqwest_error_retryable(&e) {
                    LlmError::Transport(format!("connection error: {}", e))
                } else {
                    LlmError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<OpenAIErrorResponse>(&error_text) {
                Ok(error_response) => error_response.error.message,
                Err(_) => error_text,
            };
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| LlmError::Transport(format!("Failed to read response: {}", e)))?;
        log::debug!("[OPENAI] Raw response:\n{}", response_text);

        Self::parse_completion(&response_text)
    }

    /// Send with up to `max_retries` extra attempts on transient failures
    async fn send(&self, request: &OpenAICompletionRequest) -> Result<AiResponse, LlmError> {
        log::info!(
            "[OPENAI] Sending request to {} with model {} and {} tools",
            self.endpoint,
            self.model,
            request.tools.as_ref().map(|t| t.len()).unwrap_or(0)
        );
        log::debug!(
            "[OPENAI] Full request:\n{}",
            serde_json::to_string_pretty(request).unwrap_or_default()
        );

        let mut attempt = 0;
        loop {
            match self.send_once(request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = backoff_delay(attempt);
                    log::warn!(
                        "[OPENAI] Attempt {} failed ({}), retrying in {:?}",
                        attempt,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl ChatModel for OpenAIClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<AiResponse, LlmError> {
        let request = self.build_request(messages, tools, None);
        self.send(&request).await
    }

    async fn generate_structured(
        &self,
        messages: &[Message],
        schema: &ResponseSchema,
    ) -> Result<Value, LlmError> {
        let response_format = json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "schema": schema.schema,
            }
        });
        let request = self.build_request(messages, &[], Some(response_format));
        let response = self.send(&request).await?;
        Self::parse_structured(&response.content)
    }
}
