//! Assembles agents: base Discord tools plus caller extras, bound to one invocation

use crate::ai::graph::{AgentGraph, InMemoryCheckpointer, OutputMode};
use crate::ai::ChatModel;
use crate::channels::discord_api::DiscordApi;
use crate::channels::types::InvocationContext;
use crate::config::DEFAULT_MAX_STEPS;
use crate::tools::builtin::{
    GetChannelInfoTool, GetServerInfoTool, GetUserInfoTool, ReactToMessageTool, SendMessageTool,
};
use crate::tools::{Tool, ToolContext, ToolRegistry};
use std::sync::Arc;

/// Graph settings shared by every agent a dispatcher builds
#[derive(Clone)]
pub struct AgentOptions {
    pub checkpointer: Arc<InMemoryCheckpointer>,
    pub output_mode: OutputMode,
    pub max_steps: u32,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            checkpointer: Arc::new(InMemoryCheckpointer::new()),
            output_mode: OutputMode::default(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Fresh instances of the platform tools every agent gets
pub fn build_base_tools() -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(SendMessageTool::new()),
        Arc::new(GetChannelInfoTool::new()),
        Arc::new(GetUserInfoTool::new()),
        Arc::new(GetServerInfoTool::new()),
        Arc::new(ReactToMessageTool::new()),
    ]
}

/// Build a ready-to-invoke agent. Extra tools are registered ahead of the base set.
pub fn create_agent(
    llm: Arc<dyn ChatModel>,
    extra_tools: Vec<Arc<dyn Tool>>,
    invocation: Option<InvocationContext>,
    discord: Option<Arc<dyn DiscordApi>>,
    options: AgentOptions,
) -> AgentGraph {
    let mut registry = ToolRegistry::new();
    for tool in extra_tools.into_iter().chain(build_base_tools()) {
        registry.register(tool);
    }

    let mut context = ToolContext::new();
    if let Some(invocation) = invocation {
        context = context.with_invocation(invocation);
    }
    if let Some(discord) = discord {
        context = context.with_discord(discord);
    }

    log::debug!(
        "[AI] Creating agent with tools: {}",
        registry.names().join(", ")
    );

    AgentGraph::new(llm, registry, context, options.checkpointer)
        .with_output_mode(options.output_mode)
        .with_max_steps(options.max_steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::types::{CommandContext, MessageContext};
    use crate::config::SearchConfig;
    use crate::test_support::{FakeDiscord, ScriptedModel};
    use crate::tools::builtin::GoogleSearchTool;
    use serde_json::json;

    #[test]
    fn test_base_tools_order() {
        let names: Vec<String> = build_base_tools().iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "send_message",
                "get_channel_info",
                "get_user_info",
                "get_server_info",
                "react_to_message"
            ]
        );
    }

    #[test]
    fn test_extra_tools_come_first() {
        let search: Arc<dyn Tool> = Arc::new(GoogleSearchTool::new(SearchConfig {
            api_key: "k".to_string(),
            engine_id: "cx".to_string(),
        }));
        let agent = create_agent(
            Arc::new(ScriptedModel::new()),
            vec![search],
            None,
            None,
            AgentOptions::default(),
        );
        let names = agent.tool_names();
        assert_eq!(names.len(), 6);
        assert_eq!(names[0], "google_search");
        assert_eq!(names[1], "send_message");
    }

    #[test]
    fn test_calls_do_not_share_tool_lists() {
        let first = create_agent(
            Arc::new(ScriptedModel::new()),
            vec![],
            None,
            None,
            AgentOptions::default(),
        );
        let second = create_agent(
            Arc::new(ScriptedModel::new()),
            vec![],
            None,
            None,
            AgentOptions::default(),
        );
        assert_eq!(first.tool_names().len(), 5);
        assert_eq!(second.tool_names().len(), 5);
    }

    #[tokio::test]
    async fn test_agent_tools_are_bound_to_invocation() {
        let model = Arc::new(
            ScriptedModel::approving()
                .with_tool_call("c1", "send_message", json!({"content": "pong"})),
        );
        let discord = Arc::new(FakeDiscord::new());
        let agent = create_agent(
            model,
            vec![],
            Some(InvocationContext::Command(CommandContext {
                channel_id: 33,
                guild_id: Some(1),
                author_id: 2,
                message_id: None,
            })),
            Some(discord.clone()),
            AgentOptions::default(),
        );

        let output = agent.invoke("say pong", "", Some("2")).await.unwrap();
        assert!(output.approved);
        assert_eq!(discord.sent.lock().clone(), vec![(33, "pong".to_string())]);
    }

    #[tokio::test]
    async fn test_options_are_applied() {
        let options = AgentOptions {
            output_mode: OutputMode::ValidationFeedback,
            ..AgentOptions::default()
        };
        let checkpointer = options.checkpointer.clone();
        let agent = create_agent(
            Arc::new(ScriptedModel::rejecting("not appropriate")),
            vec![],
            Some(InvocationContext::Message(MessageContext {
                message_id: 1,
                channel_id: 2,
                guild_id: None,
                author_id: 3,
            })),
            None,
            options,
        );

        let output = agent.invoke("hmm", "", None).await.unwrap();
        assert_eq!(output.text, "not appropriate");
        assert!(checkpointer.latest("user_unknown").is_some());
    }
}
