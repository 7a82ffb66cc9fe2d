//! Two-stage agent orchestration graph
//!
//! Every user request passes a gatekeeping validation before any tool can run:
//!
//! ```text
//! START → validate_task ─┬─ success → execute_task → END
//!                        └─ failure ───────────────→ END
//! ```
//!
//! - **validate_task** makes one structured call returning `{is_valid, reason}`.
//!   Any failure there rejects the request with "Validation error".
//! - **execute_task** runs a ReAct loop: the model proposes tool calls, the
//!   tools run sequentially, results are fed back, until the model answers
//!   plainly or the step budget runs out.
//!
//! State is checkpointed after each node under `user_{id}`; the caller's output
//! is read back from the last checkpoint.

pub mod checkpoint;
pub mod executor;
pub mod types;
pub mod validator;

pub use checkpoint::InMemoryCheckpointer;
pub use types::OutputMode;

use checkpoint::thread_id_for;
use executor::ReactExecutor;
use types::{AgentState, Approval, ExecutionRequest, GraphError, GraphNode, GraphOutput, Route};
use validator::Validator;

use crate::ai::ChatModel;
use crate::config::DEFAULT_MAX_STEPS;
use crate::tools::{ToolContext, ToolRegistry};
use once_cell::sync::OnceCell;
use std::sync::Arc;

pub struct AgentGraph {
    llm: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    context: ToolContext,
    checkpointer: Arc<InMemoryCheckpointer>,
    output_mode: OutputMode,
    max_steps: u32,
    executor: OnceCell<Arc<ReactExecutor>>,
}

impl AgentGraph {
    pub fn new(
        llm: Arc<dyn ChatModel>,
        tools: ToolRegistry,
        context: ToolContext,
        checkpointer: Arc<InMemoryCheckpointer>,
    ) -> Self {
        Self {
            llm,
            tools: Arc::new(tools),
            context,
            checkpointer,
            output_mode: OutputMode::default(),
            max_steps: DEFAULT_MAX_STEPS,
            executor: OnceCell::new(),
        }
    }

    pub fn with_output_mode(mut self, output_mode: OutputMode) -> Self {
        self.output_mode = output_mode;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.names()
    }

    /// The executor, constructed on first use and reused afterwards
    pub fn executor(&self) -> Arc<ReactExecutor> {
        self.executor
            .get_or_init(|| {
                log::info!(
                    "[GRAPH] Building executor on {} with tools: {}",
                    self.llm.model_name(),
                    self.tool_names().join(", ")
                );
                Arc::new(ReactExecutor::new(
                    self.llm.clone(),
                    self.tools.clone(),
                    self.context.clone(),
                ))
            })
            .clone()
    }

    async fn validate_task(&self, state: &mut AgentState) {
        log::info!("[GRAPH] Validating task: {}", state.user_request);
        let validator = Validator::new(self.llm.clone());
        let approval = match validator.validate(&state.validation_request()).await {
            Ok(approval) => approval,
            Err(e) => Approval::deny_on_error(&e),
        };
        log::info!(
            "[GRAPH] is_valid: {}, reason: {:?}",
            approval.approved,
            approval.feedback
        );
        state.validation = Some(approval);
        state.trace.push(GraphNode::ValidateTask);
    }

    /// Conditional edge out of validation. Missing validation counts as rejection.
    pub fn handle_validation(state: &AgentState) -> Route {
        if state.is_approved() {
            Route::Success
        } else {
            Route::Failure
        }
    }

    async fn execute_task(&self, state: &mut AgentState) -> Result<(), GraphError> {
        let Some(request) = ExecutionRequest::from_state(state) else {
            return Ok(());
        };
        log::info!("[GRAPH] Executing task for {:?}", request.user_id);
        self.executor().run(&request, state).await?;
        state.trace.push(GraphNode::ExecuteTask);
        Ok(())
    }

    /// Run one request through the graph and read the result back from the checkpoint
    pub async fn invoke(
        &self,
        user_request: &str,
        instruction: &str,
        user_id: Option<&str>,
    ) -> Result<GraphOutput, GraphError> {
        let thread_id = thread_id_for(user_id);
        let mut state = AgentState::new(
            user_request,
            instruction,
            user_id.map(|s| s.to_string()),
            self.max_steps,
        );

        self.validate_task(&mut state).await;
        self.checkpointer.put(&thread_id, GraphNode::ValidateTask, &state);

        match Self::handle_validation(&state) {
            Route::Success => {
                self.execute_task(&mut state).await?;
                self.checkpointer.put(&thread_id, GraphNode::ExecuteTask, &state);
            }
            Route::Failure => {
                log::warn!(
                    "[GRAPH] Request rejected for {}: {}",
                    thread_id,
                    state.feedback().unwrap_or("no reason")
                );
            }
        }

        let checkpoint = self
            .checkpointer
            .latest(&thread_id)
            .ok_or_else(|| GraphError::MissingState(thread_id.clone()))?;
        log::debug!(
            "[GRAPH] Reading {} from the {} checkpoint saved at {}",
            thread_id,
            checkpoint.node,
            checkpoint.saved_at.to_rfc3339()
        );
        let final_state = checkpoint.state;

        let text = match self.output_mode {
            OutputMode::FinalMessage => final_state
                .last_message()
                .map(|m| m.content.clone())
                .unwrap_or_default(),
            OutputMode::ValidationFeedback => final_state.feedback().unwrap_or_default().to_string(),
        };

        Ok(GraphOutput {
            text,
            approved: final_state.is_approved(),
            state: final_state,
        })
    }
}
