//! Rooms: one graph plus the set of sessions editing it
//!
//! A room's graph and member list share a single mutex, so a mutation, the
//! membership check guarding it and the relay send all happen atomically with
//! respect to other sessions of the same room. Different rooms never share a
//! lock.

mod registry;

pub use registry::{RoomRegistry, DEFAULT_ROOM_CAPACITY};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::graph_store::GraphStore;
use crate::protocol::{ServerEvent, WsMessage};
use crate::relay::RoomMessage;
use crate::session::SessionId;
use crate::utils::current_timestamp;

/// A session's entry in its room's member set
#[derive(Debug, Clone)]
pub struct Member {
    pub session_id: SessionId,
    pub username: String,
    pub joined_at: i64,
    /// Cleared on leave; the session's subscription stops delivering once false
    pub(crate) active: Arc<AtomicBool>,
}

impl Member {
    pub fn new(session_id: SessionId, username: String) -> Self {
        Self {
            session_id,
            username,
            joined_at: current_timestamp(),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

/// Mutable state of a room, guarded by the room mutex
#[derive(Debug, Default)]
pub struct RoomState {
    pub graph: GraphStore,
    pub(crate) members: Vec<Member>,
    /// Sequence id of the last message relayed in this room
    pub(crate) sequence: u64,
}

impl RoomState {
    pub fn is_member(&self, session_id: &str) -> bool {
        self.members.iter().any(|m| m.session_id == session_id)
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Usernames in join order
    pub fn usernames(&self) -> Vec<String> {
        self.members.iter().map(|m| m.username.clone()).collect()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Full snapshot and roster stamped with the last sequence id they reflect
    pub fn snapshot_message(&self) -> WsMessage {
        let event = ServerEvent::snapshot(self.graph.current_graph(), self.usernames());
        WsMessage::new(event, self.sequence)
    }
}

/// Summary of a room for listings
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub id: String,
    pub members: usize,
    pub nodes: usize,
    pub edges: usize,
    pub sequence_id: u64,
    pub created_at: i64,
}

/// An isolated collaboration space with exactly one graph and one member set
pub struct Room {
    id: String,
    state: Mutex<RoomState>,
    tx: broadcast::Sender<RoomMessage>,
    created_at: i64,
}

impl Room {
    /// Create an empty room whose relay channel buffers `capacity` messages
    pub fn new(id: impl Into<String>, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            id: id.into(),
            state: Mutex::new(RoomState::default()),
            tx,
            created_at: current_timestamp(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Lock the room's graph and member set
    pub fn lock(&self) -> MutexGuard<'_, RoomState> {
        self.state.lock()
    }

    pub fn member_count(&self) -> usize {
        self.state.lock().members.len()
    }

    pub fn usernames(&self) -> Vec<String> {
        self.state.lock().usernames()
    }

    pub fn snapshot_message(&self) -> WsMessage {
        self.state.lock().snapshot_message()
    }

    pub fn summary(&self) -> RoomSummary {
        let state = self.state.lock();
        RoomSummary {
            id: self.id.clone(),
            members: state.members.len(),
            nodes: state.graph.node_count(),
            edges: state.graph.edge_count(),
            sequence_id: state.sequence,
            created_at: self.created_at,
        }
    }

    pub(crate) fn sender(&self) -> &broadcast::Sender<RoomMessage> {
        &self.tx
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<RoomMessage> {
        self.tx.subscribe()
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
