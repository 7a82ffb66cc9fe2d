//! Agent (channel instruction) database operations

use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};
use uuid::Uuid;

use super::super::sqlite::{now_rfc3339, parse_timestamp};
use super::super::Database;
use crate::models::Agent;

impl Database {
    #[cfg(test)]
    pub fn get_agent(&self, agent_id: &str) -> SqliteResult<Option<Agent>> {
        let conn = self.conn.lock();
        Self::find_agent(&conn, agent_id)
    }

    pub(crate) fn find_agent(conn: &Connection, agent_id: &str) -> SqliteResult<Option<Agent>> {
        conn.query_row(
            "SELECT id, instruction, discord_user_id, guild_id, created_at, updated_at
             FROM agents WHERE id = ?1",
            [agent_id],
            |row| {
                let created_at: String = row.get(4)?;
                let updated_at: String = row.get(5)?;
                Ok(Agent {
                    id: row.get(0)?,
                    instruction: row.get(1)?,
                    discord_user_id: row.get(2)?,
                    guild_id: row.get(3)?,
                    created_at: parse_timestamp(&created_at),
                    updated_at: parse_timestamp(&updated_at),
                })
            },
        )
        .optional()
    }

    pub(crate) fn insert_agent(
        conn: &Connection,
        instruction: &str,
        discord_user_id: &str,
        guild_id: &str,
    ) -> SqliteResult<Agent> {
        let now = now_rfc3339();
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO agents (id, instruction, discord_user_id, guild_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            rusqlite::params![&id, instruction, discord_user_id, guild_id, &now],
        )?;

        Ok(Agent {
            id,
            instruction: Some(instruction.to_string()),
            discord_user_id: discord_user_id.to_string(),
            guild_id: guild_id.to_string(),
            created_at: parse_timestamp(&now),
            updated_at: parse_timestamp(&now),
        })
    }

    pub(crate) fn update_agent_instruction(
        conn: &Connection,
        agent_id: &str,
        instruction: &str,
    ) -> SqliteResult<()> {
        conn.execute(
            "UPDATE agents SET instruction = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![instruction, now_rfc3339(), agent_id],
        )?;
        Ok(())
    }
}
