use crate::channels::discord_api::DiscordApi;
use crate::channels::types::InvocationContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Tool groups, shown in execution logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolGroup {
    #[default]
    Messaging,
    Lookup,
    Web,
}

impl ToolGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolGroup::Messaging => "messaging",
            ToolGroup::Lookup => "lookup",
            ToolGroup::Web => "web",
        }
    }
}

/// JSON Schema property definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl PropertySchema {
    pub fn string(description: impl Into<String>) -> Self {
        PropertySchema {
            schema_type: "string".to_string(),
            description: description.into(),
            default: None,
            enum_values: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Tool input schema using JSON Schema format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: HashMap<String, PropertySchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for ToolInputSchema {
    fn default() -> Self {
        ToolInputSchema {
            schema_type: "object".to_string(),
            properties: HashMap::new(),
            required: vec![],
        }
    }
}

impl ToolInputSchema {
    /// Render as a plain JSON Schema object
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({"type": "object"}))
    }
}

/// Tool definition that gets sent to the AI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
    #[serde(skip)]
    pub group: ToolGroup,
}

/// Result of tool execution. Failures are reported as text for the model, never raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        ToolResult {
            success: true,
            content: content.into(),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let msg = message.into();
        ToolResult {
            success: false,
            content: msg.clone(),
            error: Some(msg),
        }
    }
}

/// Context bound to the tools of one agent instance
#[derive(Clone, Default)]
pub struct ToolContext {
    /// The message or command that triggered this agent
    pub invocation: Option<InvocationContext>,
    /// Platform handle for Discord side effects and lookups
    pub discord: Option<Arc<dyn DiscordApi>>,
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("invocation", &self.invocation)
            .field("discord", &self.discord.is_some())
            .finish()
    }
}

impl ToolContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_invocation(mut self, invocation: InvocationContext) -> Self {
        self.invocation = Some(invocation);
        self
    }

    pub fn with_discord(mut self, discord: Arc<dyn DiscordApi>) -> Self {
        self.discord = Some(discord);
        self
    }

    /// Invocation and platform handle together, when both are bound
    pub fn bound(&self) -> Option<(&InvocationContext, &Arc<dyn DiscordApi>)> {
        match (&self.invocation, &self.discord) {
            (Some(invocation), Some(discord)) => Some((invocation, discord)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_result_mirrors_message() {
        let result = ToolResult::error("Error: nope");
        assert!(!result.success);
        assert_eq!(result.content, "Error: nope");
        assert_eq!(result.error.as_deref(), Some("Error: nope"));
    }

    #[test]
    fn test_schema_json_shape() {
        let mut properties = HashMap::new();
        properties.insert("content".to_string(), PropertySchema::string("text"));
        let schema = ToolInputSchema {
            schema_type: "object".to_string(),
            properties,
            required: vec!["content".to_string()],
        };
        let json = schema.to_json();
        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["content"]["type"], "string");
        assert_eq!(json["required"][0], "content");
        assert!(json["properties"]["content"].get("enum").is_none());
    }

    #[test]
    fn test_group_names_match_serde() {
        for group in [ToolGroup::Messaging, ToolGroup::Lookup, ToolGroup::Web] {
            assert_eq!(serde_json::to_value(group).unwrap(), group.as_str());
        }
    }

    #[test]
    fn test_unbound_context() {
        assert!(ToolContext::new().bound().is_none());
    }
}
