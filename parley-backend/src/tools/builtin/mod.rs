//! Built-in tools for the agent
//!
//! - `discord`: messaging and guild lookups through the platform API
//! - `web_search`: Google Custom Search

pub mod discord;
mod web_search;

pub use discord::{
    GetChannelInfoTool, GetServerInfoTool, GetUserInfoTool, ReactToMessageTool, SendMessageTool,
};
pub use web_search::GoogleSearchTool;
