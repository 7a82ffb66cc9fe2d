//! Channel database operations, including the per-channel admin instruction

use rusqlite::{Connection, OptionalExtension, Result as SqliteResult};
use uuid::Uuid;

use super::super::sqlite::{now_rfc3339, parse_timestamp};
use super::super::Database;
use crate::models::{Channel, InstructionOutcome};

const CHANNEL_COLUMNS: &str =
    "id, discord_channel_id, name, guild_id, agent_id, created_at, updated_at";

impl Database {
    #[cfg(test)]
    pub fn get_channel_by_discord_id(&self, discord_channel_id: &str) -> SqliteResult<Option<Channel>> {
        let conn = self.conn.lock();
        Self::find_channel(&conn, discord_channel_id)
    }

    /// Find the channel row, creating it (and its guild) if needed
    pub fn get_or_create_channel(
        &self,
        discord_guild_id: &str,
        guild_name: Option<&str>,
        discord_channel_id: &str,
        name: Option<&str>,
    ) -> SqliteResult<Channel> {
        let conn = self.conn.lock();
        if let Some(channel) = Self::find_channel(&conn, discord_channel_id)? {
            return Ok(channel);
        }
        let guild = Self::ensure_guild(&conn, discord_guild_id, guild_name)?;
        Self::insert_channel(&conn, discord_channel_id, name, &guild.id)
    }

    /// Admin instruction for a channel of a guild, empty when none is set
    pub fn get_channel_instruction(
        &self,
        discord_guild_id: &str,
        discord_channel_id: &str,
    ) -> SqliteResult<String> {
        let conn = self.conn.lock();
        let instruction: Option<Option<String>> = conn
            .query_row(
                "SELECT a.instruction
                 FROM channels c
                 JOIN guilds g ON g.id = c.guild_id
                 JOIN agents a ON a.id = c.agent_id
                 WHERE c.discord_channel_id = ?1 AND g.discord_guild_id = ?2",
                [discord_channel_id, discord_guild_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(instruction.flatten().unwrap_or_default())
    }

    /// Set the channel's instruction, creating and linking an agent row when needed.
    /// Returns `None` when the channel is unknown.
    pub fn upsert_channel_instruction(
        &self,
        discord_channel_id: &str,
        instruction: &str,
        author_discord_id: &str,
    ) -> SqliteResult<Option<InstructionOutcome>> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let Some(channel) = Self::find_channel(&tx, discord_channel_id)? else {
            return Ok(None);
        };

        let outcome = match channel.agent_id.as_deref() {
            Some(agent_id) => match Self::find_agent(&tx, agent_id)? {
                Some(mut agent) => {
                    Self::update_agent_instruction(&tx, &agent.id, instruction)?;
                    agent.instruction = Some(instruction.to_string());
                    InstructionOutcome::Updated(agent)
                }
                None => {
                    log::warn!(
                        "[DB] Channel {} references missing agent {}",
                        discord_channel_id,
                        agent_id
                    );
                    let agent =
                        Self::insert_agent(&tx, instruction, author_discord_id, &channel.guild_id)?;
                    Self::link_agent(&tx, &channel.id, &agent.id)?;
                    InstructionOutcome::Relinked(agent)
                }
            },
            None => {
                let agent =
                    Self::insert_agent(&tx, instruction, author_discord_id, &channel.guild_id)?;
                Self::link_agent(&tx, &channel.id, &agent.id)?;
                InstructionOutcome::Created(agent)
            }
        };

        tx.commit()?;
        Ok(Some(outcome))
    }

    fn link_agent(conn: &Connection, channel_id: &str, agent_id: &str) -> SqliteResult<()> {
        conn.execute(
            "UPDATE channels SET agent_id = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![agent_id, now_rfc3339(), channel_id],
        )?;
        Ok(())
    }

    pub(crate) fn insert_channel(
        conn: &Connection,
        discord_channel_id: &str,
        name: Option<&str>,
        guild_id: &str,
    ) -> SqliteResult<Channel> {
        let now = now_rfc3339();
        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO channels (id, discord_channel_id, name, guild_id, agent_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?5)",
            rusqlite::params![&id, discord_channel_id, name, guild_id, &now],
        )?;
        log::info!(
            "[DB] Created channel {} in database",
            name.unwrap_or(discord_channel_id)
        );

        Ok(Channel {
            id,
            discord_channel_id: discord_channel_id.to_string(),
            name: name.map(|s| s.to_string()),
            guild_id: guild_id.to_string(),
            agent_id: None,
            created_at: parse_timestamp(&now),
            updated_at: parse_timestamp(&now),
        })
    }

    pub(crate) fn find_channel(
        conn: &Connection,
        discord_channel_id: &str,
    ) -> SqliteResult<Option<Channel>> {
        conn.query_row(
            &format!(
                "SELECT {} FROM channels WHERE discord_channel_id = ?1",
                CHANNEL_COLUMNS
            ),
            [discord_channel_id],
            |row| {
                let created_at: String = row.get(5)?;
                let updated_at: String = row.get(6)?;
                Ok(Channel {
                    id: row.get(0)?,
                    discord_channel_id: row.get(1)?,
                    name: row.get(2)?,
                    guild_id: row.get(3)?,
                    agent_id: row.get(4)?,
                    created_at: parse_timestamp(&created_at),
                    updated_at: parse_timestamp(&updated_at),
                })
            },
        )
        .optional()
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::InstructionOutcome;

    fn seeded() -> Database {
        let db = Database::new(":memory:").unwrap();
        db.record_guild("1", "Parley HQ", &[("10".to_string(), "general".to_string())])
            .unwrap();
        db
    }

    #[test]
    fn test_instruction_defaults_to_empty() {
        let db = seeded();
        assert_eq!(db.get_channel_instruction("1", "10").unwrap(), "");
        assert_eq!(db.get_channel_instruction("1", "99").unwrap(), "");
    }

    #[test]
    fn test_create_then_update_instruction() {
        let db = seeded();

        let created = db
            .upsert_channel_instruction("10", "Be a pirate", "500")
            .unwrap()
            .unwrap();
        assert!(matches!(created, InstructionOutcome::Created(_)));
        assert_eq!(db.get_channel_instruction("1", "10").unwrap(), "Be a pirate");

        let updated = db
            .upsert_channel_instruction("10", "Be a poet", "500")
            .unwrap()
            .unwrap();
        assert!(matches!(updated, InstructionOutcome::Updated(_)));
        assert_eq!(updated.agent().id, created.agent().id);
        assert_eq!(db.get_channel_instruction("1", "10").unwrap(), "Be a poet");

        let channel = db.get_channel_by_discord_id("10").unwrap().unwrap();
        assert_eq!(channel.agent_id.as_deref(), Some(created.agent().id.as_str()));
        let agent = db.get_agent(&created.agent().id).unwrap().unwrap();
        assert_eq!(agent.discord_user_id, "500");
    }

    #[test]
    fn test_instruction_is_scoped_by_guild() {
        let db = seeded();
        db.upsert_channel_instruction("10", "Be brief", "500").unwrap();
        assert_eq!(db.get_channel_instruction("2", "10").unwrap(), "");
    }

    #[test]
    fn test_unknown_channel() {
        let db = seeded();
        assert!(db
            .upsert_channel_instruction("404", "anything", "500")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_get_or_create_channel_creates_guild() {
        let db = Database::new(":memory:").unwrap();
        let channel = db
            .get_or_create_channel("7", Some("Seven"), "70", Some("lobby"))
            .unwrap();
        let again = db.get_or_create_channel("7", None, "70", None).unwrap();
        assert_eq!(channel.id, again.id);
        assert!(db.get_guild_by_discord_id("7").unwrap().is_some());
    }
}
