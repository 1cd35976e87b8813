//! Relay/Broadcast Engine
//!
//! Each room owns a `tokio::sync::broadcast` channel. Publishing happens with
//! the room lock held, which makes relay order identical to the order in which
//! the Graph Store accepted mutations. Every message records its originating
//! session so subscribers can skip their own echoes.

mod subscription;

pub use subscription::Subscription;

use std::sync::Arc;

use crate::error::{SyncError, SyncResult};
use crate::protocol::{ServerEvent, WsMessage};
use crate::room::{Room, RoomRegistry, RoomState};
use crate::session::SessionId;

/// A relayed message plus the session it must not be echoed to
#[derive(Debug, Clone)]
pub struct RoomMessage {
    pub origin: Option<SessionId>,
    pub message: WsMessage,
}

/// Fans accepted events out to the members of a room
#[derive(Clone)]
pub struct RelayEngine {
    registry: Arc<RoomRegistry>,
}

impl RelayEngine {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver `event` to every joined session of `room_id` except `exclude`
    ///
    /// Returns the sequence id assigned to the message.
    pub fn broadcast(
        &self,
        room_id: &str,
        event: ServerEvent,
        exclude: Option<&str>,
    ) -> SyncResult<u64> {
        let room = self
            .registry
            .room(room_id)
            .ok_or_else(|| SyncError::RoomNotFound(room_id.to_string()))?;
        let mut state = room.lock();
        Ok(Self::publish(&room, &mut state, event, exclude))
    }

    /// Stamp and send a message; the caller must hold the room lock via `state`
    pub(crate) fn publish(
        room: &Room,
        state: &mut RoomState,
        event: ServerEvent,
        exclude: Option<&str>,
    ) -> u64 {
        state.sequence += 1;
        let message = RoomMessage {
            origin: exclude.map(str::to_owned),
            message: WsMessage::new(event, state.sequence),
        };

        // Ignore send errors - just means no receivers are subscribed
        let _ = room.sender().send(message);
        state.sequence
    }
}
