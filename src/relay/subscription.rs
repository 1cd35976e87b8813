//! Per-session view of a room's relay stream

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use super::RoomMessage;
use crate::protocol::WsMessage;
use crate::room::Room;
use crate::session::SessionId;

/// Receiving half of a joined session
///
/// Filters out the session's own echoes and anything already covered by the
/// last snapshot it delivered. A receiver that falls behind the room channel
/// is handed a fresh snapshot instead of the missed deltas.
pub struct Subscription {
    session_id: SessionId,
    room: Arc<Room>,
    rx: broadcast::Receiver<RoomMessage>,
    active: Arc<AtomicBool>,
    /// Highest sequence id already reflected in what this session received
    floor: u64,
}

impl Subscription {
    pub(crate) fn new(
        session_id: SessionId,
        room: Arc<Room>,
        rx: broadcast::Receiver<RoomMessage>,
        active: Arc<AtomicBool>,
        floor: u64,
    ) -> Self {
        Self {
            session_id,
            room,
            rx,
            active,
            floor,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn room_id(&self) -> &str {
        self.room.id()
    }

    /// False once the session has left its room
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait for the next message for this session
    ///
    /// Returns `None` once the session has left.
    pub async fn recv(&mut self) -> Option<WsMessage> {
        loop {
            if !self.is_active() {
                return None;
            }

            match self.rx.recv().await {
                Ok(msg) => {
                    if let Some(message) = self.accept(msg) {
                        return Some(message);
                    }
                }
                Err(RecvError::Lagged(missed)) => return Some(self.resync(missed)),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv)
    pub fn try_recv(&mut self) -> Option<WsMessage> {
        loop {
            if !self.is_active() {
                return None;
            }

            match self.rx.try_recv() {
                Ok(msg) => {
                    if let Some(message) = self.accept(msg) {
                        return Some(message);
                    }
                }
                Err(TryRecvError::Lagged(missed)) => return Some(self.resync(missed)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drain everything currently queued
    pub fn drain(&mut self) -> Vec<WsMessage> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Fresh snapshot of the room; anything it already covers is skipped
    pub fn snapshot(&mut self) -> WsMessage {
        let snapshot = self.room.snapshot_message();
        self.note_snapshot(&snapshot);
        snapshot
    }

    /// Record that `snapshot` was delivered through another path
    pub fn note_snapshot(&mut self, snapshot: &WsMessage) {
        if snapshot.is_snapshot() {
            self.floor = self.floor.max(snapshot.sequence_id);
        }
    }

    fn accept(&mut self, msg: RoomMessage) -> Option<WsMessage> {
        if msg.message.sequence_id <= self.floor {
            return None;
        }
        self.floor = msg.message.sequence_id;

        if msg.origin.as_deref() == Some(self.session_id.as_str()) {
            return None;
        }
        Some(msg.message)
    }

    fn resync(&mut self, missed: u64) -> WsMessage {
        tracing::warn!(
            room = %self.room.id(),
            session_id = %self.session_id,
            missed,
            "Subscriber lagged, sending fresh snapshot"
        );
        let snapshot = self.room.snapshot_message();
        self.floor = snapshot.sequence_id;
        snapshot
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("session_id", &self.session_id)
            .field("room", &self.room.id())
            .field("floor", &self.floor)
            .finish()
    }
}
