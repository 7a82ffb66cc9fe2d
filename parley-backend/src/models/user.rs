use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Discord user the bot has seen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub discord_user_id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
