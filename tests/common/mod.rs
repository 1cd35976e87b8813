//! Shared helpers: an in-process client that behaves like a WebSocket
//! connection driving a `LocalReplica`

#![allow(dead_code)]

use std::sync::Arc;

use diagram_sync::{
    ClientEvent, DiagramGraph, LocalReplica, RoomRegistry, ServerEvent, SessionHandle,
    SessionManager, WsMessage,
};

pub fn setup() -> SessionManager {
    SessionManager::new(Arc::new(RoomRegistry::new()))
}

pub fn snapshot_graph(msg: &WsMessage) -> DiagramGraph {
    match &msg.event {
        ServerEvent::Snapshot { nodes, edges, .. } => {
            DiagramGraph::with_data(nodes.clone(), edges.clone())
        }
        other => panic!("expected snapshot, got {:?}", other),
    }
}

pub struct TestClient {
    pub handle: SessionHandle,
    pub replica: LocalReplica,
}

impl TestClient {
    /// Join and apply the initial snapshot
    pub fn join(sessions: &SessionManager, room_id: &str, username: &str) -> Self {
        let handle = sessions.join(room_id, username).unwrap();
        let mut replica = LocalReplica::new(room_id, username);
        replica.apply_remote(&handle.snapshot).unwrap();
        Self { handle, replica }
    }

    pub fn session_id(&self) -> &str {
        self.handle.session_id()
    }

    /// Send an event and apply the replies, like the connection handler does
    pub fn send(&mut self, sessions: &SessionManager, event: ClientEvent) {
        let replies = sessions.respond(&self.handle.info.session_id, &mut self.handle.events, event);
        for reply in &replies {
            self.replica.apply_remote(reply).unwrap();
        }
    }

    /// Apply everything the relay has queued for this session
    pub fn sync(&mut self, sessions: &SessionManager) {
        let mut resync = false;
        for msg in self.handle.events.drain() {
            if self.replica.apply_remote(&msg).is_err() {
                resync = true;
            }
        }
        if resync {
            self.send(sessions, ClientEvent::RequestSnapshot);
        }
    }

    pub fn graph(&self) -> DiagramGraph {
        self.replica.current_graph()
    }
}

/// The room's authoritative graph, as seen by `client`'s session
pub fn authoritative(sessions: &SessionManager, client: &TestClient) -> DiagramGraph {
    snapshot_graph(&sessions.snapshot(client.session_id()).unwrap())
}
