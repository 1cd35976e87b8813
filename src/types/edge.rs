//! Edge types for the shared diagram

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::NodeId;

/// Opaque edge identifier, unique within a room
pub type EdgeId = String;

/// Directed edge between two nodes of the same room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    #[serde(alias = "sourceNodeId")]
    pub source: NodeId,
    #[serde(alias = "targetNodeId")]
    pub target: NodeId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    /// Free-form presentation metadata (arrow markers, stroke, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<serde_json::Value>,
}

impl Edge {
    /// Create an edge with an explicit id
    pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            edge_type: None,
            style: None,
        }
    }

    /// Create an edge with a freshly minted random id
    pub fn with_random_id(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self::new(Uuid::new_v4().to_string(), source, target)
    }

    pub fn with_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = Some(edge_type.into());
        self
    }

    pub fn with_style(mut self, style: serde_json::Value) -> Self {
        self.style = Some(style);
        self
    }

    /// Check if the edge touches the given node on either end
    pub fn is_incident_to(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_edge_accepts_long_endpoint_names() {
        let edge: Edge = serde_json::from_value(json!({
            "id": "e1",
            "sourceNodeId": "a",
            "targetNodeId": "b"
        }))
        .unwrap();

        assert_eq!(edge.source, "a");
        assert_eq!(edge.target, "b");
    }

    #[test]
    fn test_edge_style_roundtrips_opaque() {
        let edge = Edge::new("e1", "a", "b")
            .with_type("smoothstep")
            .with_style(json!({"markerEnd": {"type": "arrowclosed"}}));

        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["type"], "smoothstep");
        assert_eq!(json["style"]["markerEnd"]["type"], "arrowclosed");
        assert_eq!(json["source"], "a");
    }

    #[test]
    fn test_is_incident_to() {
        let edge = Edge::new("e1", "a", "b");
        assert!(edge.is_incident_to("a"));
        assert!(edge.is_incident_to("b"));
        assert!(!edge.is_incident_to("c"));
    }
}
