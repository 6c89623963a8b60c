//! Inheritance edges.
//!
//! Edges run parent → child and only ever come from parent references
//! that the indexer resolved to a concrete tag.

use serde::{Deserialize, Serialize};

/// Edge weight stored in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Position of the reference in the child's parent list.
    pub parent_slot: usize,
}

impl Edge {
    pub fn new(parent_slot: usize) -> Self {
        Self { parent_slot }
    }
}

/// A simplified edge for export and rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}
