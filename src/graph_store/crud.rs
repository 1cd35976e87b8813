//! Mutation operations for the graph store

use crate::error::{SyncError, SyncResult};
use crate::types::{DiagramGraph, Edge, Node, NodePatch};

use super::{GraphStore, RemovedNode, Upsert};

fn check_id(kind: &str, id: &str) -> SyncResult<()> {
    if id.trim().is_empty() {
        return Err(SyncError::MalformedEvent(format!("{} id must not be empty", kind)));
    }
    Ok(())
}

fn check_endpoints(store: &GraphStore, edge: &Edge) -> SyncResult<()> {
    for endpoint in [&edge.source, &edge.target] {
        if !store.nodes.contains_key(endpoint) {
            return Err(SyncError::InvalidReference {
                edge_id: edge.id.clone(),
                node_id: endpoint.clone(),
            });
        }
    }
    Ok(())
}

/// Replace the store contents with a snapshot
pub fn apply_snapshot(store: &mut GraphStore, graph: DiagramGraph) -> usize {
    store.nodes.clear();
    store.edges.clear();

    for node in graph.nodes {
        if !node.id.trim().is_empty() {
            store.nodes.insert(node.id.clone(), node);
        }
    }

    let mut dropped = 0;
    for edge in graph.edges {
        if edge.id.trim().is_empty() || check_endpoints(store, &edge).is_err() {
            dropped += 1;
            continue;
        }
        store.edges.insert(edge.id.clone(), edge);
    }

    dropped
}

pub fn add_node(store: &mut GraphStore, node: Node) -> SyncResult<()> {
    check_id("node", &node.id)?;
    if store.nodes.contains_key(&node.id) {
        return Err(SyncError::DuplicateId {
            kind: "node",
            id: node.id,
        });
    }
    store.nodes.insert(node.id.clone(), node);
    Ok(())
}

pub fn upsert_node(store: &mut GraphStore, node: Node) -> SyncResult<Upsert> {
    check_id("node", &node.id)?;
    match store.nodes.get_mut(&node.id) {
        Some(existing) if *existing == node => Ok(Upsert::Unchanged),
        Some(existing) => {
            *existing = node;
            Ok(Upsert::Updated)
        }
        None => {
            store.nodes.insert(node.id.clone(), node);
            Ok(Upsert::Created)
        }
    }
}

pub fn update_node(store: &mut GraphStore, id: &str, patch: &NodePatch) -> bool {
    match store.nodes.get_mut(id) {
        Some(node) => patch.apply_to(node),
        None => false,
    }
}

pub fn delete_node(store: &mut GraphStore, id: &str) -> Option<RemovedNode> {
    let node = store.nodes.remove(id)?;

    let incident: Vec<String> = store.incident_edges(id).map(|e| e.id.clone()).collect();

    let edges = incident
        .iter()
        .filter_map(|edge_id| store.edges.remove(edge_id))
        .collect();

    Some(RemovedNode { node, edges })
}

pub fn add_edge(store: &mut GraphStore, edge: Edge) -> SyncResult<()> {
    check_id("edge", &edge.id)?;
    if store.edges.contains_key(&edge.id) {
        return Err(SyncError::DuplicateId {
            kind: "edge",
            id: edge.id,
        });
    }
    check_endpoints(store, &edge)?;
    store.edges.insert(edge.id.clone(), edge);
    Ok(())
}

pub fn upsert_edge(store: &mut GraphStore, edge: Edge) -> SyncResult<Upsert> {
    check_id("edge", &edge.id)?;
    check_endpoints(store, &edge)?;
    match store.edges.get_mut(&edge.id) {
        Some(existing) if *existing == edge => Ok(Upsert::Unchanged),
        Some(existing) => {
            *existing = edge;
            Ok(Upsert::Updated)
        }
        None => {
            store.edges.insert(edge.id.clone(), edge);
            Ok(Upsert::Created)
        }
    }
}

pub fn delete_edge(store: &mut GraphStore, id: &str) -> Option<Edge> {
    store.edges.remove(id)
}
