//! Database table modules - extend Database with domain-specific methods
//!
//! Each module adds an `impl Database` block for one table.

mod agents;   // agents
mod channels; // channels, instruction lookup and upsert
mod guilds;   // guilds, guild snapshots
mod messages; // messages
mod users;    // users
