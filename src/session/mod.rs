//! Sessions: one participant's live connection to a room
//!
//! A session moves `connecting → joined → disconnected`. The manager owns
//! every session record; rooms only hold a [`Member`](crate::room::Member)
//! entry keyed by the session id.

mod manager;

pub use manager::{Outcome, SessionManager};

use serde::Serialize;

use crate::protocol::WsMessage;
use crate::relay::Subscription;

/// Session identifier (random v4 UUID)
pub type SessionId = String;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Connecting,
    Joined,
    /// Terminal
    Disconnected,
}

impl SessionState {
    /// Check whether moving to `next` is a legal transition
    pub fn can_transition_to(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (SessionState::Connecting, SessionState::Joined)
                | (SessionState::Connecting, SessionState::Disconnected)
                | (SessionState::Joined, SessionState::Disconnected)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == SessionState::Disconnected
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Joined => write!(f, "joined"),
            SessionState::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Session record
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: SessionId,
    pub username: String,
    pub room_id: String,
    pub state: SessionState,
    pub connected_at: i64,
    /// Last-known presence timestamp
    pub last_seen: i64,
}

impl SessionInfo {
    pub(crate) fn connecting(session_id: SessionId, username: String, room_id: String, now: i64) -> Self {
        Self {
            session_id,
            username,
            room_id,
            state: SessionState::Connecting,
            connected_at: now,
            last_seen: now,
        }
    }

    /// Move to `next`; illegal transitions are ignored and return false
    pub fn transition(&mut self, next: SessionState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }
        self.state = next;
        true
    }

    pub fn is_joined(&self) -> bool {
        self.state == SessionState::Joined
    }
}

/// What a successful join hands back to the connection
///
/// This is the session's only link to the relay: the initial snapshot to
/// send first, then the subscription yielding everything after it.
#[derive(Debug)]
pub struct SessionHandle {
    pub info: SessionInfo,
    pub snapshot: WsMessage,
    pub events: Subscription,
}

impl SessionHandle {
    pub fn session_id(&self) -> &str {
        &self.info.session_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine() {
        use SessionState::*;

        assert!(Connecting.can_transition_to(Joined));
        assert!(Connecting.can_transition_to(Disconnected));
        assert!(Joined.can_transition_to(Disconnected));

        assert!(!Joined.can_transition_to(Connecting));
        assert!(!Disconnected.can_transition_to(Joined));
        assert!(!Disconnected.can_transition_to(Connecting));
        assert!(Disconnected.is_terminal());
    }

    #[test]
    fn test_transition_ignores_illegal_moves() {
        let mut info = SessionInfo::connecting("s1".into(), "alice".into(), "r1".into(), 0);
        assert!(info.transition(SessionState::Joined));
        assert!(info.is_joined());
        assert!(!info.transition(SessionState::Connecting));
        assert!(info.transition(SessionState::Disconnected));
        assert!(!info.transition(SessionState::Joined));
        assert_eq!(info.state.to_string(), "disconnected");
    }
}
