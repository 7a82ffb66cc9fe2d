use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Admin instruction attached to one channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub instruction: Option<String>,
    /// Discord id of the owner who wrote the instruction
    pub discord_user_id: String,
    pub guild_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What an instruction upsert did
#[derive(Debug, Clone)]
pub enum InstructionOutcome {
    Created(Agent),
    Updated(Agent),
    /// The channel pointed at a missing agent; a new one was created and linked
    Relinked(Agent),
}

impl InstructionOutcome {
    pub fn agent(&self) -> &Agent {
        match self {
            InstructionOutcome::Created(agent)
            | InstructionOutcome::Updated(agent)
            | InstructionOutcome::Relinked(agent) => agent,
        }
    }
}
