//! Data types for the diagram sync server
//!
//! This module contains the diagram data structures shared by the server
//! engine and the client replica.

mod edge;
mod graph;
mod node;

pub use edge::{Edge, EdgeId};
pub use graph::DiagramGraph;
pub use node::{Node, NodeId, NodePatch, Position};
