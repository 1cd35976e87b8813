//! Shared application state

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::room::RoomRegistry;
use crate::session::SessionManager;

/// Shared application state for HTTP handlers and WebSocket connections
pub struct AppState {
    /// Session manager, the entry point for every room operation
    pub sessions: Arc<SessionManager>,

    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            sessions: Arc::new(SessionManager::with_config(&config)),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        self.sessions.registry()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_shares_one_registry() {
        let state = AppState::new(ServerConfig::default().with_room_channel_capacity(8));
        let handle = state.sessions.join("r1", "alice").unwrap();

        assert!(state.registry().room_exists("r1"));
        assert_eq!(state.registry().room_count(), 1);
        assert_eq!(handle.info.room_id, "r1");
    }
}
