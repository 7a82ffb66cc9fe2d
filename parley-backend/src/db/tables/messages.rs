//! Message database operations

use rusqlite::Result as SqliteResult;
use uuid::Uuid;

use super::super::sqlite::{now_rfc3339, parse_timestamp};
use super::super::Database;
use crate::models::{NewMessage, StoredMessage};

impl Database {
    pub fn save_message(&self, message: &NewMessage<'_>) -> SqliteResult<StoredMessage> {
        let conn = self.conn.lock();
        let now = now_rfc3339();
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO messages (id, discord_message_id, discord_user_id, content, channel_id, user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            rusqlite::params![
                &id,
                message.discord_message_id,
                message.discord_user_id,
                message.content,
                message.channel_id,
                message.user_id,
                &now
            ],
        )?;

        Ok(StoredMessage {
            id,
            discord_message_id: message.discord_message_id.to_string(),
            discord_user_id: message.discord_user_id.to_string(),
            content: message.content.to_string(),
            channel_id: message.channel_id.to_string(),
            user_id: message.user_id.to_string(),
            created_at: parse_timestamp(&now),
            updated_at: parse_timestamp(&now),
        })
    }

    #[cfg(test)]
    /// Most recent messages of a channel, oldest first
    pub fn get_channel_messages(&self, channel_id: &str, limit: usize) -> SqliteResult<Vec<StoredMessage>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, discord_message_id, discord_user_id, content, channel_id, user_id, created_at, updated_at
             FROM messages WHERE channel_id = ?1
             ORDER BY created_at DESC, rowid DESC LIMIT ?2",
        )?;

        let mut messages: Vec<StoredMessage> = stmt
            .query_map(rusqlite::params![channel_id, limit as i64], |row| {
                let created_at: String = row.get(6)?;
                let updated_at: String = row.get(7)?;
                Ok(StoredMessage {
                    id: row.get(0)?,
                    discord_message_id: row.get(1)?,
                    discord_user_id: row.get(2)?,
                    content: row.get(3)?,
                    channel_id: row.get(4)?,
                    user_id: row.get(5)?,
                    created_at: parse_timestamp(&created_at),
                    updated_at: parse_timestamp(&updated_at),
                })
            })?
            .filter_map(|r| r.ok())
            .collect();
        messages.reverse();
        Ok(messages)
    }
}
