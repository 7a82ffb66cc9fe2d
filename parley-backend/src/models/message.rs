use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub discord_message_id: String,
    pub discord_user_id: String,
    pub content: String,
    pub channel_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload; `channel_id` and `user_id` are store row ids
#[derive(Debug, Clone)]
pub struct NewMessage<'a> {
    pub discord_message_id: &'a str,
    pub discord_user_id: &'a str,
    pub content: &'a str,
    pub channel_id: &'a str,
    pub user_id: &'a str,
}
