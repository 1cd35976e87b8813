//! Canonical event protocol spoken over the relay transport
//!
//! Every message is a JSON object tagged by `"type"` with camelCase payload
//! fields. Server messages are wrapped in [`WsMessage`], which adds the
//! per-room sequence id and a timestamp.

use serde::{Deserialize, Serialize};

use crate::types::{DiagramGraph, Edge, EdgeId, Node, NodeId};
use crate::utils::current_timestamp;

/// A graph mutation, the unit the Graph Store accepts and the relay fans out
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Mutation {
    /// Add or overwrite one node
    NodeUpsert { node: Node },

    /// Delete a node and every edge incident to it
    NodeDelete { node_id: NodeId },

    /// Add or overwrite one edge
    EdgeUpsert { edge: Edge },

    /// Delete one edge
    EdgeDelete { edge_id: EdgeId },
}

/// Messages a client sends to the relay
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Attach to a room, creating it on first join
    JoinRoom { room_id: String, username: String },

    NodeUpsert { node: Node },
    NodeDelete { node_id: NodeId },
    EdgeUpsert { edge: Edge },
    EdgeDelete { edge_id: EdgeId },

    /// Ask for a fresh full snapshot of the room
    RequestSnapshot,

    /// Heartbeat; refreshes the session's last-seen timestamp
    Ping,
}

impl ClientEvent {
    /// Extract the graph mutation carried by this event, if any
    pub fn into_mutation(self) -> Option<Mutation> {
        match self {
            ClientEvent::NodeUpsert { node } => Some(Mutation::NodeUpsert { node }),
            ClientEvent::NodeDelete { node_id } => Some(Mutation::NodeDelete { node_id }),
            ClientEvent::EdgeUpsert { edge } => Some(Mutation::EdgeUpsert { edge }),
            ClientEvent::EdgeDelete { edge_id } => Some(Mutation::EdgeDelete { edge_id }),
            ClientEvent::JoinRoom { .. } | ClientEvent::RequestSnapshot | ClientEvent::Ping => {
                None
            }
        }
    }

    pub fn join(room_id: impl Into<String>, username: impl Into<String>) -> Self {
        ClientEvent::JoinRoom {
            room_id: room_id.into(),
            username: username.into(),
        }
    }
}

impl From<Mutation> for ClientEvent {
    fn from(mutation: Mutation) -> Self {
        match mutation {
            Mutation::NodeUpsert { node } => ClientEvent::NodeUpsert { node },
            Mutation::NodeDelete { node_id } => ClientEvent::NodeDelete { node_id },
            Mutation::EdgeUpsert { edge } => ClientEvent::EdgeUpsert { edge },
            Mutation::EdgeDelete { edge_id } => ClientEvent::EdgeDelete { edge_id },
        }
    }
}

/// Messages the relay sends to clients
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Full authoritative graph state plus the roster at the same point
    Snapshot {
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        #[serde(default)]
        members: Vec<String>,
    },

    /// Current roster, in join order
    PresenceUpdate { members: Vec<String> },

    MemberJoined { username: String },
    MemberLeft { username: String },

    NodeUpsert { node: Node },
    NodeDelete { node_id: NodeId },
    EdgeUpsert { edge: Edge },
    EdgeDelete { edge_id: EdgeId },

    /// Non-fatal failure notice
    ConnectionError { reason: String },

    /// The sender's mutation was accepted; the message's sequence id is the
    /// last relayed message the sender's write already supersedes
    Ack,

    Pong,
}

impl ServerEvent {
    pub fn snapshot(graph: DiagramGraph, members: Vec<String>) -> Self {
        ServerEvent::Snapshot {
            nodes: graph.nodes,
            edges: graph.edges,
            members,
        }
    }

    pub fn connection_error(reason: impl Into<String>) -> Self {
        ServerEvent::ConnectionError {
            reason: reason.into(),
        }
    }

    /// Convert a relayed delta back into a mutation (for replicas)
    pub fn as_mutation(&self) -> Option<Mutation> {
        match self {
            ServerEvent::NodeUpsert { node } => Some(Mutation::NodeUpsert { node: node.clone() }),
            ServerEvent::NodeDelete { node_id } => Some(Mutation::NodeDelete {
                node_id: node_id.clone(),
            }),
            ServerEvent::EdgeUpsert { edge } => Some(Mutation::EdgeUpsert { edge: edge.clone() }),
            ServerEvent::EdgeDelete { edge_id } => Some(Mutation::EdgeDelete {
                edge_id: edge_id.clone(),
            }),
            _ => None,
        }
    }
}

impl From<Mutation> for ServerEvent {
    fn from(mutation: Mutation) -> Self {
        match mutation {
            Mutation::NodeUpsert { node } => ServerEvent::NodeUpsert { node },
            Mutation::NodeDelete { node_id } => ServerEvent::NodeDelete { node_id },
            Mutation::EdgeUpsert { edge } => ServerEvent::EdgeUpsert { edge },
            Mutation::EdgeDelete { edge_id } => ServerEvent::EdgeDelete { edge_id },
        }
    }
}

/// Server message wrapper with metadata
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WsMessage {
    /// The event
    #[serde(flatten)]
    pub event: ServerEvent,

    /// Per-room monotonically increasing sequence ID
    ///
    /// For snapshots this is the id of the last relayed message the snapshot
    /// already reflects.
    pub sequence_id: u64,

    /// Unix timestamp when the message was created
    pub timestamp: i64,
}

impl WsMessage {
    pub fn new(event: ServerEvent, sequence_id: u64) -> Self {
        Self {
            event,
            sequence_id,
            timestamp: current_timestamp(),
        }
    }

    pub fn is_snapshot(&self) -> bool {
        matches!(self.event, ServerEvent::Snapshot { .. })
    }
}
