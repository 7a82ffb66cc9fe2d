pub mod discord;
pub mod discord_api;
pub mod dispatcher;
pub mod types;

pub use dispatcher::MessageDispatcher;

use once_cell::sync::OnceCell;
use std::sync::atomic::{AtomicBool, Ordering};

/// Gateway connection state shared between the listener and the health endpoint
#[derive(Default)]
pub struct DiscordStatus {
    connected: AtomicBool,
    bot_id: OnceCell<u64>,
}

impl DiscordStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_ready(&self, bot_id: u64) {
        if self.bot_id.set(bot_id).is_err() && self.bot_id.get() != Some(&bot_id) {
            log::warn!("[DISCORD] Bot id changed after ready; keeping the first one");
        }
        self.connected.store(true, Ordering::SeqCst);
    }

    pub fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Our own user id, known once the gateway sent READY
    pub fn bot_id(&self) -> Option<u64> {
        self.bot_id.get().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lifecycle() {
        let status = DiscordStatus::new();
        assert!(!status.is_connected());
        assert_eq!(status.bot_id(), None);

        status.mark_ready(42);
        assert!(status.is_connected());
        assert_eq!(status.bot_id(), Some(42));

        // Reconnects resend READY
        status.mark_ready(42);
        status.mark_disconnected();
        assert!(!status.is_connected());
        assert_eq!(status.bot_id(), Some(42));
    }
}
