//! Graph Store - one room's authoritative diagram
//!
//! Pure in-memory node/edge set with synchronous, deterministic mutation
//! operations. The store does no locking of its own: the owning room holds
//! it behind a mutex, and client replicas own theirs outright.

mod crud;

use std::collections::BTreeMap;

use crate::error::SyncResult;
use crate::protocol::Mutation;
use crate::types::{DiagramGraph, Edge, EdgeId, Node, NodeId, NodePatch};

/// Outcome of an add-or-replace operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// The id was not present before
    Created,
    /// The id existed and at least one field was overwritten
    Updated,
    /// The id existed with identical content
    Unchanged,
}

impl Upsert {
    pub fn changed(self) -> bool {
        !matches!(self, Upsert::Unchanged)
    }
}

/// A node removed together with its incident edges
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedNode {
    pub node: Node,
    pub edges: Vec<Edge>,
}

/// In-memory diagram with keyed nodes and edges
///
/// Invariants: ids are unique per kind, and every edge's endpoints are
/// present in `nodes`.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    pub(crate) nodes: BTreeMap<NodeId, Node>,
    pub(crate) edges: BTreeMap<EdgeId, Edge>,
}

impl GraphStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot, dropping dangling edges
    pub fn from_graph(graph: DiagramGraph) -> Self {
        let mut store = Self::new();
        store.apply_snapshot(graph);
        store
    }

    /// Copy of the current graph, nodes and edges ordered by id
    pub fn current_graph(&self) -> DiagramGraph {
        DiagramGraph::with_data(
            self.nodes.values().cloned().collect(),
            self.edges.values().cloned().collect(),
        )
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Edges with `node_id` as source or target
    pub fn incident_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.values().filter(move |e| e.is_incident_to(node_id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

// Mutation operations live in crud.rs
impl GraphStore {
    /// Replace the whole graph; returns how many dangling edges were dropped
    pub fn apply_snapshot(&mut self, graph: DiagramGraph) -> usize {
        crud::apply_snapshot(self, graph)
    }

    /// Strict add: fails if the id is already present
    pub fn add_node(&mut self, node: Node) -> SyncResult<()> {
        crud::add_node(self, node)
    }

    /// Add or replace a node (last-accepted-wins)
    pub fn upsert_node(&mut self, node: Node) -> SyncResult<Upsert> {
        crud::upsert_node(self, node)
    }

    /// Patch an existing node; unknown ids are a no-op returning false
    pub fn update_node(&mut self, id: &str, patch: &NodePatch) -> bool {
        crud::update_node(self, id, patch)
    }

    /// Remove a node and its incident edges; unknown ids are a no-op
    pub fn delete_node(&mut self, id: &str) -> Option<RemovedNode> {
        crud::delete_node(self, id)
    }

    /// Strict add: fails on duplicate id or missing endpoint
    pub fn add_edge(&mut self, edge: Edge) -> SyncResult<()> {
        crud::add_edge(self, edge)
    }

    /// Add or replace an edge; endpoints are re-validated
    pub fn upsert_edge(&mut self, edge: Edge) -> SyncResult<Upsert> {
        crud::upsert_edge(self, edge)
    }

    /// Remove one edge; unknown ids are a no-op
    pub fn delete_edge(&mut self, id: &str) -> Option<Edge> {
        crud::delete_edge(self, id)
    }

    /// Apply a protocol mutation, returning whether the graph changed
    pub fn apply_mutation(&mut self, mutation: &Mutation) -> SyncResult<bool> {
        match mutation {
            Mutation::NodeUpsert { node } => Ok(self.upsert_node(node.clone())?.changed()),
            Mutation::NodeDelete { node_id } => Ok(self.delete_node(node_id).is_some()),
            Mutation::EdgeUpsert { edge } => Ok(self.upsert_edge(edge.clone())?.changed()),
            Mutation::EdgeDelete { edge_id } => Ok(self.delete_edge(edge_id).is_some()),
        }
    }
}
