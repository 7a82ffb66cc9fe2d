use crate::tools::types::{ToolContext, ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A function the model may call
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    fn name(&self) -> String {
        self.definition().name
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult;
}

/// Tools available to one agent, kept in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A later tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        } else {
            log::warn!("[TOOLS] Tool '{}' registered twice, keeping the last", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition())
            .collect()
    }

    /// Execute a tool by name. Unknown names become an error result.
    pub async fn execute(&self, name: &str, params: Value, context: &ToolContext) -> ToolResult {
        match self.get(name) {
            Some(tool) => {
                log::info!(
                    "[TOOLS] Executing '{}' ({})",
                    name,
                    tool.definition().group.as_str()
                );
                let result = tool.execute(params, context).await;
                if !result.success {
                    log::warn!("[TOOLS] '{}' failed: {}", name, result.content);
                }
                result
            }
            None => {
                log::warn!("[TOOLS] Model requested unknown tool '{}'", name);
                ToolResult::error(format!("Error: Unknown tool '{}'", name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::ToolInputSchema;

    struct EchoTool(&'static str);

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.0.to_string(),
                description: "echo".to_string(),
                input_schema: ToolInputSchema::default(),
                group: Default::default(),
            }
        }

        async fn execute(&self, params: Value, _context: &ToolContext) -> ToolResult {
            ToolResult::success(params.to_string())
        }
    }

    #[test]
    fn test_definitions_keep_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool("b")));
        registry.register(Arc::new(EchoTool("a")));
        registry.register(Arc::new(EchoTool("b")));
        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(registry.names(), vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error_result() {
        let registry = ToolRegistry::new();
        let result = registry
            .execute("nope", serde_json::json!({}), &ToolContext::new())
            .await;
        assert!(!result.success);
        assert_eq!(result.content, "Error: Unknown tool 'nope'");
    }
}
