//! Agent graph state and stage types

use crate::ai::types::LlmError;
use crate::ai::Message;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Nodes of the orchestration graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GraphNode {
    ValidateTask,
    ExecuteTask,
}

/// Outcome of the conditional edge after validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Route {
    Success,
    Failure,
}

/// What an invocation returns to its caller
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OutputMode {
    /// Content of the last message in the final state
    #[default]
    FinalMessage,
    /// The validator's feedback string
    ValidationFeedback,
}

/// Effective result of the validation stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub approved: bool,
    pub feedback: Option<String>,
}

impl Approval {
    pub fn deny(feedback: impl Into<String>) -> Self {
        Self {
            approved: false,
            feedback: Some(feedback.into()),
        }
    }

    /// Fail closed: any validator failure rejects the request
    pub fn deny_on_error(err: &ValidationError) -> Self {
        log::error!("[GRAPH] Error during validation: {}", err);
        Self::deny("Validation error")
    }
}

/// Shape the validator model must answer with
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationVerdict {
    pub is_valid: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl From<ValidationVerdict> for Approval {
    fn from(verdict: ValidationVerdict) -> Self {
        Approval {
            approved: verdict.is_valid,
            feedback: verdict.reason,
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("validator returned a malformed verdict: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("no checkpointed state for thread '{0}'")]
    MissingState(String),
    #[error("executor failed: {0}")]
    Execution(#[from] LlmError),
}

/// Input of the validation stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    pub user_request: String,
}

/// Input of the execution stage. Only exists for approved runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub instruction: String,
    pub user_request: String,
    pub user_id: Option<String>,
}

impl ExecutionRequest {
    pub fn from_state(state: &AgentState) -> Option<Self> {
        match &state.validation {
            Some(approval) if approval.approved => Some(Self {
                instruction: state.instruction.clone(),
                user_request: state.user_request.clone(),
                user_id: state.user_id.clone(),
            }),
            _ => None,
        }
    }
}

/// State threaded through one graph run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub instruction: String,
    pub user_request: String,
    pub user_id: Option<String>,
    /// `None` until the validator has run
    pub validation: Option<Approval>,
    /// Append-only conversation
    pub messages: Vec<Message>,
    pub remaining_steps: u32,
    /// Nodes visited, in order
    pub trace: Vec<GraphNode>,
}

impl AgentState {
    pub fn new(
        user_request: impl Into<String>,
        instruction: impl Into<String>,
        user_id: Option<String>,
        max_steps: u32,
    ) -> Self {
        let user_request = user_request.into();
        Self {
            instruction: instruction.into(),
            messages: vec![Message::user(user_request.clone())],
            user_request,
            user_id,
            validation: None,
            remaining_steps: max_steps,
            trace: vec![],
        }
    }

    pub fn validation_request(&self) -> ValidationRequest {
        ValidationRequest {
            user_request: self.user_request.clone(),
        }
    }

    pub fn is_approved(&self) -> bool {
        self.validation.as_ref().map(|a| a.approved).unwrap_or(false)
    }

    pub fn feedback(&self) -> Option<&str> {
        self.validation.as_ref().and_then(|a| a.feedback.as_deref())
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Final value of an invocation
#[derive(Debug, Clone, PartialEq)]
pub struct GraphOutput {
    pub text: String,
    pub approved: bool,
    pub state: AgentState,
}
