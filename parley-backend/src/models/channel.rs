use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A guild text channel. `agent_id` links the channel to its admin instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub discord_channel_id: String,
    pub name: Option<String>,
    pub guild_id: String,
    pub agent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
