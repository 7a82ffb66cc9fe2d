//! User database operations

use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};
use uuid::Uuid;

use super::super::sqlite::{now_rfc3339, parse_timestamp};
use super::super::Database;
use crate::models::User;

const USER_COLUMNS: &str = "id, discord_user_id, username, email, created_at, updated_at";

impl Database {
    /// Find the user row for a Discord id, creating it on first sight
    pub fn get_or_create_user(
        &self,
        discord_user_id: &str,
        username: Option<&str>,
    ) -> SqliteResult<User> {
        let conn = self.conn.lock();
        if let Some(user) = Self::find_user(&conn, discord_user_id)? {
            return Ok(user);
        }

        let now = now_rfc3339();
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO users (id, discord_user_id, username, email, created_at, updated_at)
             VALUES (?1, ?2, ?3, NULL, ?4, ?4)",
            rusqlite::params![&id, discord_user_id, username, &now],
        )?;
        log::info!(
            "[DB] Created user {} in database",
            username.unwrap_or(discord_user_id)
        );

        Ok(User {
            id,
            discord_user_id: discord_user_id.to_string(),
            username: username.map(|s| s.to_string()),
            email: None,
            created_at: parse_timestamp(&now),
            updated_at: parse_timestamp(&now),
        })
    }

    #[cfg(test)]
    pub fn get_user_by_discord_id(&self, discord_user_id: &str) -> SqliteResult<Option<User>> {
        let conn = self.conn.lock();
        Self::find_user(&conn, discord_user_id)
    }

    fn find_user(conn: &Connection, discord_user_id: &str) -> SqliteResult<Option<User>> {
        conn.query_row(
            &format!("SELECT {} FROM users WHERE discord_user_id = ?1", USER_COLUMNS),
            [discord_user_id],
            Self::row_to_user,
        )
        .optional()
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let created_at: String = row.get(4)?;
        let updated_at: String = row.get(5)?;
        Ok(User {
            id: row.get(0)?,
            discord_user_id: row.get(1)?,
            username: row.get(2)?,
            email: row.get(3)?,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }
}
