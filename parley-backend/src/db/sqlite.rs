//! SQLite database - schema definitions and connection management
//!
//! Table operations live in `tables/`, one `impl Database` block per table.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;

/// Main database wrapper; a single connection behind a mutex
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database file and make sure the schema exists
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }

        let conn = Connection::open(database_url)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> SqliteResult<()> {
        let conn = self.conn.lock();

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                discord_user_id TEXT UNIQUE NOT NULL,
                username TEXT,
                email TEXT UNIQUE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS guilds (
                id TEXT PRIMARY KEY,
                discord_guild_id TEXT UNIQUE NOT NULL,
                name TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS agents (
                id TEXT PRIMARY KEY,
                instruction TEXT,
                discord_user_id TEXT NOT NULL,
                guild_id TEXT NOT NULL REFERENCES guilds(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        // agent_id stays NULL until an instruction is set for the channel
        conn.execute(
            "CREATE TABLE IF NOT EXISTS channels (
                id TEXT PRIMARY KEY,
                discord_channel_id TEXT UNIQUE NOT NULL,
                name TEXT,
                guild_id TEXT NOT NULL REFERENCES guilds(id) ON DELETE CASCADE,
                agent_id TEXT UNIQUE REFERENCES agents(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                discord_message_id TEXT NOT NULL,
                discord_user_id TEXT NOT NULL,
                content TEXT NOT NULL,
                channel_id TEXT NOT NULL REFERENCES channels(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_messages_channel ON messages(channel_id, created_at)",
            [],
        )?;

        log::info!("[DB] Schema ready");
        Ok(())
    }
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
