use crate::ai::graph::types::{AgentState, ExecutionRequest};
use crate::ai::{ChatModel, LlmError, Message};
use crate::tools::{ToolContext, ToolRegistry};
use std::sync::Arc;

const EXECUTE_PROMPT: &str = include_str!("prompts/execute.md");

/// Reason-act-observe loop over the agent's tools.
///
/// Built once per graph; the task prompt comes from each run's `ExecutionRequest`.
pub struct ReactExecutor {
    llm: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    context: ToolContext,
}

impl ReactExecutor {
    pub fn new(llm: Arc<dyn ChatModel>, tools: Arc<ToolRegistry>, context: ToolContext) -> Self {
        Self {
            llm,
            tools,
            context,
        }
    }

    /// Placeholders are only filled from the template, never from the inserted text
    pub fn render_prompt(request: &ExecutionRequest) -> String {
        EXECUTE_PROMPT
            .split("{user_request}")
            .map(|part| part.replace("{instruction}", &request.instruction))
            .collect::<Vec<_>>()
            .join(&request.user_request)
    }

    /// Run until the model answers without tool calls or the step budget is spent.
    /// Running out of steps is not an error; the partial conversation stays in `state`.
    pub async fn run(
        &self,
        request: &ExecutionRequest,
        state: &mut AgentState,
    ) -> Result<(), LlmError> {
        let system = Message::system(Self::render_prompt(request));
        let definitions = self.tools.definitions();

        loop {
            if state.remaining_steps == 0 {
                log::warn!(
                    "[EXECUTOR] Step budget exhausted for user {:?}",
                    request.user_id
                );
                return Ok(());
            }

            let mut conversation = Vec::with_capacity(state.messages.len() + 1);
            conversation.push(system.clone());
            conversation.extend(state.messages.iter().cloned());

            let response = self.llm.generate_with_tools(&conversation, &definitions).await?;
            state.remaining_steps -= 1;

            if !response.is_tool_use() {
                log::info!(
                    "[EXECUTOR] Finished with {} steps left",
                    state.remaining_steps
                );
                state.messages.push(Message::assistant(response.content));
                return Ok(());
            }

            log::info!(
                "[EXECUTOR] Model requested {} tool call(s): {}",
                response.tool_calls.len(),
                response
                    .tool_calls
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            state.messages.push(Message::assistant_with_tools(
                response.content,
                response.tool_calls.clone(),
            ));

            // Sequential, in the order the model asked for them
            for call in &response.tool_calls {
                let result = self
                    .tools
                    .execute(&call.name, call.arguments.clone(), &self.context)
                    .await;
                state.messages.push(Message::tool(&call.id, result.content));
            }
        }
    }
}
