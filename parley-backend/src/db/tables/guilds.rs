//! Guild database operations

use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};
use uuid::Uuid;

use super::super::sqlite::{now_rfc3339, parse_timestamp};
use super::super::Database;
use crate::models::Guild;

impl Database {
    #[cfg(test)]
    pub fn get_or_create_guild(&self, discord_guild_id: &str, name: Option<&str>) -> SqliteResult<Guild> {
        let conn = self.conn.lock();
        Self::ensure_guild(&conn, discord_guild_id, name)
    }

    #[cfg(test)]
    pub fn get_guild_by_discord_id(&self, discord_guild_id: &str) -> SqliteResult<Option<Guild>> {
        let conn = self.conn.lock();
        Self::find_guild(&conn, discord_guild_id)
    }

    /// Persist a guild and its text channels. Existing rows are left alone.
    /// Returns the number of channels that were new.
    pub fn record_guild(
        &self,
        discord_guild_id: &str,
        name: &str,
        text_channels: &[(String, String)],
    ) -> SqliteResult<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let guild = Self::ensure_guild(&tx, discord_guild_id, Some(name))?;
        let mut created = 0;
        for (discord_channel_id, channel_name) in text_channels {
            if Self::find_channel(&tx, discord_channel_id)?.is_some() {
                log::debug!("[DB] Channel {} already exists in database", channel_name);
                continue;
            }
            Self::insert_channel(&tx, discord_channel_id, Some(channel_name), &guild.id)?;
            created += 1;
        }

        tx.commit()?;
        log::info!(
            "[DB] Saved guild {} with {} new text channels",
            name,
            created
        );
        Ok(created)
    }

    pub(crate) fn ensure_guild(
        conn: &Connection,
        discord_guild_id: &str,
        name: Option<&str>,
    ) -> SqliteResult<Guild> {
        if let Some(guild) = Self::find_guild(conn, discord_guild_id)? {
            return Ok(guild);
        }

        let now = now_rfc3339();
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO guilds (id, discord_guild_id, name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            rusqlite::params![&id, discord_guild_id, name, &now],
        )?;
        log::info!(
            "[DB] Created guild {} in database",
            name.unwrap_or(discord_guild_id)
        );

        Ok(Guild {
            id,
            discord_guild_id: discord_guild_id.to_string(),
            name: name.map(|s| s.to_string()),
            created_at: parse_timestamp(&now),
            updated_at: parse_timestamp(&now),
        })
    }

    fn find_guild(conn: &Connection, discord_guild_id: &str) -> SqliteResult<Option<Guild>> {
        conn.query_row(
            "SELECT id, discord_guild_id, name, created_at, updated_at
             FROM guilds WHERE discord_guild_id = ?1",
            [discord_guild_id],
            |row| {
                let created_at: String = row.get(3)?;
                let updated_at: String = row.get(4)?;
                Ok(Guild {
                    id: row.get(0)?,
                    discord_guild_id: row.get(1)?,
                    name: row.get(2)?,
                    created_at: parse_timestamp(&created_at),
                    updated_at: parse_timestamp(&updated_at),
                })
            },
        )
        .optional()
    }
}
