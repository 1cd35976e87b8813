//! Diagram Sync Server
//!
//! Room-scoped real-time synchronization for collaboratively edited
//! node/edge diagrams. Every room holds one authoritative graph; members
//! send mutations over a WebSocket, the server validates them against the
//! graph and relays accepted ones to everyone else in the room, in the
//! order it accepted them.
//!
//! # Modules
//!
//! - `types`: Core data structures (Node, Edge, DiagramGraph)
//! - `protocol`: Client and server event types
//! - `graph_store`: Authoritative per-room graph with validated mutations
//! - `room`: Rooms and the registry that creates and discards them
//! - `session`: Session lifecycle and event handling
//! - `relay`: Ordered per-room fan-out
//! - `presence`: Rosters and join/leave notifications
//! - `client`: Optimistic client replica and reconnect policy
//! - `api`: Axum router (WebSocket and REST)
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use diagram_sync::{ClientEvent, Node, Position, RoomRegistry, SessionManager};
//!
//! let sessions = SessionManager::new(Arc::new(RoomRegistry::new()));
//! let alice = sessions.join("r1", "alice").unwrap();
//! let mut bob = sessions.join("r1", "bob").unwrap();
//!
//! let node = Node::new("n1", "Start", Position::new(0.0, 0.0));
//! sessions
//!     .handle(alice.session_id(), ClientEvent::NodeUpsert { node })
//!     .unwrap();
//!
//! assert!(bob.events.drain().iter().any(|m| m.event.as_mutation().is_some()));
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod graph_store;
pub mod presence;
pub mod protocol;
pub mod relay;
pub mod room;
pub mod session;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use client::{connect_with_retry, ConnectionStatus, LocalReplica, ReconnectPolicy};
pub use config::ServerConfig;
pub use error::{SyncError, SyncResult};
pub use graph_store::GraphStore;
pub use presence::PresenceTracker;
pub use protocol::{ClientEvent, Mutation, ServerEvent, WsMessage};
pub use relay::{RelayEngine, Subscription};
pub use room::{Room, RoomRegistry};
pub use session::{Outcome, SessionHandle, SessionInfo, SessionManager, SessionState};
pub use types::{DiagramGraph, Edge, Node, NodePatch, Position};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
