//! Error types for the sync engine

use thiserror::Error;

/// Result type for sync engine operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised while joining rooms or applying graph mutations
///
/// None of these are fatal to a room: a rejected operation is dropped and the
/// rest of the room keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Join attempted without a room id or username
    #[error("room id and username are both required")]
    MissingIdentity,

    /// Edge names a node that is not in the room's graph
    #[error("edge {edge_id} references missing node {node_id}")]
    InvalidReference { edge_id: String, node_id: String },

    /// Operation against a room with no active sessions
    #[error("room not found: {0}")]
    RoomNotFound(String),

    /// Relay unreachable or connection dropped
    #[error("transport failure after {attempts} attempt(s): {reason}")]
    TransportFailure { attempts: u32, reason: String },

    /// Strict add of an id that is already present
    #[error("{kind} id already exists: {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// Unparseable frame or structurally invalid payload
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("session {0} is not joined to a room")]
    NotJoined(String),
}

impl SyncError {
    /// Short machine-readable code, used in `connection_error` payloads and REST errors
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::MissingIdentity => "missing_identity",
            SyncError::InvalidReference { .. } => "invalid_reference",
            SyncError::RoomNotFound(_) => "room_not_found",
            SyncError::TransportFailure { .. } => "transport_failure",
            SyncError::DuplicateId { .. } => "duplicate_id",
            SyncError::MalformedEvent(_) => "malformed_event",
            SyncError::SessionNotFound(_) => "session_not_found",
            SyncError::NotJoined(_) => "not_joined",
        }
    }

    /// Whether the requester's optimistic state should be replaced by a fresh snapshot
    ///
    /// Dangling references and operations against vanished rooms mean the
    /// client's local copy disagrees with the authoritative graph.
    pub fn needs_resync(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidReference { .. } | SyncError::RoomNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = SyncError::InvalidReference {
            edge_id: "e1".to_string(),
            node_id: "ghost".to_string(),
        };
        assert_eq!(err.to_string(), "edge e1 references missing node ghost");

        let err = SyncError::TransportFailure {
            attempts: 5,
            reason: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "transport failure after 5 attempt(s): connection refused"
        );
    }

    #[test]
    fn test_resync_classification() {
        assert!(SyncError::RoomNotFound("r1".into()).needs_resync());
        assert!(!SyncError::MissingIdentity.needs_resync());
        assert!(!SyncError::MalformedEvent("bad".into()).needs_resync());
    }
}
