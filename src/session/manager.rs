//! Session manager
//!
//! Translates inbound client events into Graph Store mutations and hands
//! accepted ones to the relay. Each session record keeps its room, so the
//! mutation path takes only that room's lock and never the registry's.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use super::{SessionHandle, SessionId, SessionInfo, SessionState};
use crate::config::ServerConfig;
use crate::error::{SyncError, SyncResult};
use crate::presence::PresenceTracker;
use crate::protocol::{ClientEvent, ServerEvent, WsMessage};
use crate::relay::{RelayEngine, Subscription};
use crate::room::{Member, Room, RoomRegistry};
use crate::utils::current_timestamp;

/// Result of handling one client event
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Mutation accepted and relayed under this sequence id
    Relayed { sequence_id: u64 },
    /// Mutation accepted but changed nothing, so nothing was relayed;
    /// `sequence_id` is the room's sequence at that point
    Unchanged { sequence_id: u64 },
    /// Message to send back to the requesting session only
    Reply(WsMessage),
}

impl Outcome {
    /// The message owed to the sender
    pub fn into_reply(self) -> WsMessage {
        match self {
            Outcome::Relayed { sequence_id } | Outcome::Unchanged { sequence_id } => {
                WsMessage::new(ServerEvent::Ack, sequence_id)
            }
            Outcome::Reply(msg) => msg,
        }
    }
}

struct SessionEntry {
    info: SessionInfo,
    room: Arc<Room>,
}

/// Tracks connected sessions and routes their events
pub struct SessionManager {
    registry: Arc<RoomRegistry>,
    relay: RelayEngine,
    presence: PresenceTracker,
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    max_username_len: usize,
}

impl SessionManager {
    /// Create a manager over an existing registry with default limits
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self::with_registry(registry, &ServerConfig::default())
    }

    /// Create a manager and registry from configuration
    pub fn with_config(config: &ServerConfig) -> Self {
        let registry = Arc::new(RoomRegistry::with_capacity(config.room_channel_capacity));
        Self::with_registry(registry, config)
    }

    pub fn with_registry(registry: Arc<RoomRegistry>, config: &ServerConfig) -> Self {
        Self {
            relay: RelayEngine::new(Arc::clone(&registry)),
            presence: PresenceTracker::new(Arc::clone(&registry)),
            registry,
            sessions: RwLock::new(HashMap::new()),
            max_username_len: config.max_username_len,
        }
    }

    /// Generate a new session ID
    pub fn generate_session_id() -> SessionId {
        Uuid::new_v4().to_string()
    }

    /// Join `room_id` as `username`
    ///
    /// The returned handle starts with a snapshot of the room, roster
    /// included, taken in the same critical section that subscribes the
    /// session, so the snapshot plus the subscription's stream is exactly
    /// the room's history from here on.
    pub fn join(&self, room_id: &str, username: &str) -> SyncResult<SessionHandle> {
        let room_id = room_id.trim();
        let username = username.trim();
        if room_id.is_empty() || username.is_empty() {
            return Err(SyncError::MissingIdentity);
        }
        let username: String = username.chars().take(self.max_username_len).collect();

        let now = current_timestamp();
        let mut info = SessionInfo::connecting(
            Self::generate_session_id(),
            username,
            room_id.to_string(),
            now,
        );

        let (room, snapshot, events) = self.registry.attach(room_id, |room, state| {
            let member = Member::new(info.session_id.clone(), info.username.clone());
            let active = Arc::clone(&member.active);

            let rx = room.subscribe();
            PresenceTracker::record_join(room, state, member);

            // Taken after the join so the newcomer's roster includes itself
            let snapshot = state.snapshot_message();
            let events = Subscription::new(
                info.session_id.clone(),
                Arc::clone(room),
                rx,
                active,
                snapshot.sequence_id,
            );
            (Arc::clone(room), snapshot, events)
        });

        info.transition(SessionState::Joined);
        self.sessions.write().insert(
            info.session_id.clone(),
            SessionEntry {
                info: info.clone(),
                room,
            },
        );

        tracing::info!(
            room = %info.room_id,
            session_id = %info.session_id,
            username = %info.username,
            "Session joined"
        );

        Ok(SessionHandle {
            info,
            snapshot,
            events,
        })
    }

    /// Disconnect a session, notifying its room
    ///
    /// Unknown sessions are ignored. Returns the final session record.
    pub fn leave(&self, session_id: &str) -> Option<SessionInfo> {
        let mut info = self.sessions.write().remove(session_id)?.info;
        info.transition(SessionState::Disconnected);

        self.presence.member_left(&info.room_id, session_id);

        tracing::info!(
            room = %info.room_id,
            session_id = %info.session_id,
            username = %info.username,
            room_alive = self.registry.room_exists(&info.room_id),
            "Session left"
        );
        Some(info)
    }

    /// Handle one event received from a joined session
    pub fn handle(&self, session_id: &str, event: ClientEvent) -> SyncResult<Outcome> {
        let (info, room) = self.touch_entry(session_id)?;

        match event {
            ClientEvent::Ping => Ok(Outcome::Reply(WsMessage::new(ServerEvent::Pong, 0))),
            ClientEvent::RequestSnapshot => Ok(Outcome::Reply(room.snapshot_message())),
            ClientEvent::JoinRoom { .. } => Err(SyncError::MalformedEvent(format!(
                "session already joined to room {}",
                info.room_id
            ))),
            mutation => {
                let Some(mutation) = mutation.into_mutation() else {
                    return Err(SyncError::MalformedEvent("not a graph mutation".to_string()));
                };

                let mut state = room.lock();
                if !state.is_member(session_id) {
                    return Err(SyncError::NotJoined(session_id.to_string()));
                }

                let result = state.graph.apply_mutation(&mutation);
                match result {
                    Ok(true) => {
                        let sequence_id = RelayEngine::publish(
                            &room,
                            &mut state,
                            mutation.into(),
                            Some(session_id),
                        );
                        Ok(Outcome::Relayed { sequence_id })
                    }
                    Ok(false) => Ok(Outcome::Unchanged {
                        sequence_id: state.sequence(),
                    }),
                    Err(err) => {
                        tracing::debug!(
                            room = %info.room_id,
                            session_id = %session_id,
                            error = %err,
                            "Mutation rejected"
                        );
                        Err(err)
                    }
                }
            }
        }
    }

    /// Handle an event and build the replies owed to the sender, in order
    ///
    /// Every mutation gets exactly one answer: an `ack`, or a
    /// `connection_error` that is followed by a fresh snapshot when the
    /// sender's optimistic state needs replacing.
    pub fn respond(
        &self,
        session_id: &str,
        events: &mut Subscription,
        event: ClientEvent,
    ) -> Vec<WsMessage> {
        match self.handle(session_id, event) {
            Ok(outcome) => {
                let reply = outcome.into_reply();
                events.note_snapshot(&reply);
                vec![reply]
            }
            Err(e) => {
                let mut replies = vec![WsMessage::new(ServerEvent::connection_error(e.to_string()), 0)];
                if e.needs_resync() {
                    replies.push(events.snapshot());
                }
                replies
            }
        }
    }

    /// Fresh full snapshot of the session's room
    pub fn snapshot(&self, session_id: &str) -> SyncResult<WsMessage> {
        let sessions = self.sessions.read();
        let entry = sessions
            .get(session_id)
            .ok_or_else(|| SyncError::SessionNotFound(session_id.to_string()))?;
        Ok(entry.room.snapshot_message())
    }

    /// Refresh the session's last-seen timestamp
    ///
    /// Fails unless the session exists and is joined.
    pub fn touch(&self, session_id: &str) -> SyncResult<SessionInfo> {
        self.touch_entry(session_id).map(|(info, _)| info)
    }

    fn touch_entry(&self, session_id: &str) -> SyncResult<(SessionInfo, Arc<Room>)> {
        let mut sessions = self.sessions.write();
        let entry = sessions
            .get_mut(session_id)
            .ok_or_else(|| SyncError::SessionNotFound(session_id.to_string()))?;
        if !entry.info.is_joined() {
            return Err(SyncError::NotJoined(session_id.to_string()));
        }
        entry.info.last_seen = current_timestamp();
        Ok((entry.info.clone(), Arc::clone(&entry.room)))
    }

    /// Get session by ID
    pub fn session(&self, session_id: &str) -> Option<SessionInfo> {
        self.sessions.read().get(session_id).map(|e| e.info.clone())
    }

    /// Get active session count
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    pub fn relay(&self) -> &RelayEngine {
        &self.relay
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }
}
