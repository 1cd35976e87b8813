//! Node types for the shared diagram

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque node identifier, unique within a room
pub type NodeId = String;

/// Canvas coordinates of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Positioned, labeled node in a diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub position: Position,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
}

impl Node {
    /// Create a node with an explicit id
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            position,
            node_type: None,
        }
    }

    /// Create a node with a freshly minted random id
    pub fn with_random_id(label: impl Into<String>, position: Position) -> Self {
        Self::new(Uuid::new_v4().to_string(), label, position)
    }

    /// Set the type tag
    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }
}

/// Partial update of a node's fields
///
/// Absent fields are left untouched. Present fields overwrite whatever the
/// node currently holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
}

impl NodePatch {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// Apply the patch, returning true if any field changed
    pub fn apply_to(&self, node: &mut Node) -> bool {
        let mut changed = false;

        if let Some(label) = &self.label {
            if node.label != *label {
                node.label = label.clone();
                changed = true;
            }
        }
        if let Some(position) = self.position {
            if node.position != position {
                node.position = position;
                changed = true;
            }
        }
        if let Some(node_type) = &self.node_type {
            if node.node_type.as_deref() != Some(node_type.as_str()) {
                node.node_type = Some(node_type.clone());
                changed = true;
            }
        }

        changed
    }
}
