//! Optimistic local copy of a room's graph
//!
//! Local edits apply immediately and yield the event to send. Messages from
//! the relay overwrite local state: a snapshot replaces everything, deltas
//! patch it.
//!
//! The relay never echoes a sender's own writes, it acknowledges them. Until
//! that `ack` arrives, any delta touching the same node or edge was accepted
//! before the local write and is skipped; after it, deltas up to the acked
//! sequence id are skipped. This keeps every replica on the last accepted
//! write even when two members edit the same element at once.

use std::collections::{HashMap, VecDeque};

use crate::error::{SyncError, SyncResult};
use crate::graph_store::GraphStore;
use crate::protocol::{ClientEvent, Mutation, ServerEvent, WsMessage};
use crate::types::{DiagramGraph, Edge, Node, NodePatch, Position};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Element {
    Node(String),
    Edge(String),
}

impl Element {
    fn of(mutation: &Mutation) -> Self {
        match mutation {
            Mutation::NodeUpsert { node } => Element::Node(node.id.clone()),
            Mutation::NodeDelete { node_id } => Element::Node(node_id.clone()),
            Mutation::EdgeUpsert { edge } => Element::Edge(edge.id.clone()),
            Mutation::EdgeDelete { edge_id } => Element::Edge(edge_id.clone()),
        }
    }
}

/// Client-side replica of one room
#[derive(Debug, Clone)]
pub struct LocalReplica {
    room_id: String,
    username: String,
    graph: GraphStore,
    members: Vec<String>,
    notifications: Vec<String>,
    error: Option<String>,
    /// Sequence id of the last relay message applied
    last_sequence: Option<u64>,
    /// Local writes sent but not yet answered, oldest first
    pending: VecDeque<Mutation>,
    /// Acked local writes and the sequence id they supersede
    acked: HashMap<Element, u64>,
}

impl LocalReplica {
    pub fn new(room_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            username: username.into(),
            graph: GraphStore::new(),
            members: Vec::new(),
            notifications: Vec::new(),
            error: None,
            last_sequence: None,
            pending: VecDeque::new(),
            acked: HashMap::new(),
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The `join_room` event for this replica's room and user
    pub fn join_event(&self) -> ClientEvent {
        ClientEvent::join(self.room_id.clone(), self.username.clone())
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn current_graph(&self) -> DiagramGraph {
        self.graph.current_graph()
    }

    /// Roster from the last snapshot or presence update
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Error banner text, if the relay reported a problem
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Take pending join/leave notifications
    pub fn take_notifications(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notifications)
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    /// Number of local writes still waiting for the relay's answer
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Create a node with a fresh id
    pub fn create_node(&mut self, label: impl Into<String>, position: Position) -> ClientEvent {
        let node = Node::with_random_id(label, position);
        // A fresh v4 id is never empty, so the upsert cannot fail
        let _ = self.graph.upsert_node(node.clone());
        self.track(Mutation::NodeUpsert { node })
    }

    pub fn rename_node(&mut self, id: &str, label: impl Into<String>) -> Option<ClientEvent> {
        self.patch_node(id, &NodePatch::label(label))
    }

    pub fn move_node(&mut self, id: &str, position: Position) -> Option<ClientEvent> {
        self.patch_node(id, &NodePatch::position(position))
    }

    fn patch_node(&mut self, id: &str, patch: &NodePatch) -> Option<ClientEvent> {
        if !self.graph.update_node(id, patch) {
            return None;
        }
        let node = self.graph.node(id)?.clone();
        Some(self.track(Mutation::NodeUpsert { node }))
    }

    /// Delete a node and its incident edges locally
    pub fn delete_node(&mut self, id: &str) -> Option<ClientEvent> {
        let removed = self.graph.delete_node(id)?;
        Some(self.track(Mutation::NodeDelete {
            node_id: removed.node.id,
        }))
    }

    /// Draw an edge between two existing nodes
    pub fn connect(&mut self, source: &str, target: &str) -> SyncResult<ClientEvent> {
        let edge = Edge::with_random_id(source, target);
        self.graph.add_edge(edge.clone())?;
        Ok(self.track(Mutation::EdgeUpsert { edge }))
    }

    pub fn disconnect(&mut self, edge_id: &str) -> Option<ClientEvent> {
        let edge = self.graph.delete_edge(edge_id)?;
        Some(self.track(Mutation::EdgeDelete { edge_id: edge.id }))
    }

    fn track(&mut self, mutation: Mutation) -> ClientEvent {
        self.pending.push_back(mutation.clone());
        mutation.into()
    }

    /// Apply a message received from the relay
    ///
    /// Returns `Ok(false)` for stale or ignored messages. A delta the local
    /// graph cannot take is an error; the caller should follow up with
    /// `request_snapshot`.
    pub fn apply_remote(&mut self, message: &WsMessage) -> SyncResult<bool> {
        match &message.event {
            ServerEvent::Ack => {
                if let Some(write) = self.pending.pop_front() {
                    self.acked.insert(Element::of(&write), message.sequence_id);
                }
                return Ok(true);
            }
            ServerEvent::ConnectionError { reason } => {
                // The oldest write, if any, was rejected; a snapshot follows
                // when local state needs correcting
                self.pending.pop_front();
                self.error = Some(reason.clone());
                return Ok(true);
            }
            ServerEvent::Pong => return Ok(false),
            _ => {}
        }

        if self.is_stale(message) {
            tracing::debug!(
                room = %self.room_id,
                sequence_id = message.sequence_id,
                last = ?self.last_sequence,
                "Ignoring stale message"
            );
            return Ok(false);
        }

        match &message.event {
            ServerEvent::Snapshot {
                nodes,
                edges,
                members,
            } => {
                self.graph
                    .apply_snapshot(DiagramGraph::with_data(nodes.clone(), edges.clone()));
                self.members = members.clone();
                self.acked.clear();
                // Writes still in flight land after this snapshot
                for write in &self.pending {
                    let _ = self.graph.apply_mutation(write);
                }
                self.error = None;
            }
            ServerEvent::PresenceUpdate { members } => {
                self.members = members.clone();
            }
            ServerEvent::MemberJoined { username } => {
                self.notifications.push(format!("{} joined the room", username));
            }
            ServerEvent::MemberLeft { username } => {
                self.notifications.push(format!("{} left the room", username));
            }
            event => {
                if let Some(mutation) = event.as_mutation() {
                    self.apply_delta(&mutation, message.sequence_id)?;
                }
            }
        }

        self.last_sequence = Some(message.sequence_id);
        self.acked.retain(|_, superseded| *superseded > message.sequence_id);
        Ok(true)
    }

    fn apply_delta(&mut self, mutation: &Mutation, sequence_id: u64) -> SyncResult<()> {
        // Cascade by hand: edges written locally after the delete was
        // accepted survive it on the server
        if let Mutation::NodeDelete { node_id } = mutation {
            let cascaded: Vec<String> = self
                .graph
                .incident_edges(node_id)
                .filter(|e| !self.is_superseded(&Element::Edge(e.id.clone()), sequence_id))
                .map(|e| e.id.clone())
                .collect();
            for edge_id in cascaded {
                self.graph.delete_edge(&edge_id);
            }

            // A surviving edge means the server re-created the node before
            // accepting it; that upsert is still on its way
            let referenced = self.graph.incident_edges(node_id).next().is_some();
            if !referenced && !self.is_superseded(&Element::Node(node_id.clone()), sequence_id) {
                self.graph.delete_node(node_id);
            }
            return Ok(());
        }

        if self.is_superseded(&Element::of(mutation), sequence_id) {
            return Ok(());
        }

        match self.graph.apply_mutation(mutation) {
            Ok(_) => Ok(()),
            // Endpoint deleted locally by a newer write; the server drops the edge as well
            Err(SyncError::InvalidReference { node_id, .. })
                if self.is_superseded(&Element::Node(node_id.clone()), sequence_id) =>
            {
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn is_superseded(&self, element: &Element, sequence_id: u64) -> bool {
        self.pending.iter().any(|write| Element::of(write) == *element)
            || self
                .acked
                .get(element)
                .is_some_and(|superseded| sequence_id <= *superseded)
    }

    /// Snapshots at the last applied sequence are still taken: they are how
    /// the relay corrects a rejected optimistic edit.
    fn is_stale(&self, message: &WsMessage) -> bool {
        match self.last_sequence {
            None => false,
            Some(last) if message.is_snapshot() => message.sequence_id < last,
            Some(last) => message.sequence_id <= last,
        }
    }
}
