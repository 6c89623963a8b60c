//! Core graph data structure.
//!
//! `ClassGraph` wraps petgraph and indexes nodes by their string id and by
//! the tag key they were built from. It is derived state: every rebuild
//! produces a fresh graph.

use crate::edge::{Edge, GraphEdge};
use crate::key_index::KeyIndex;
use crate::layout::Layout;
use crate::node::GraphNode;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strata_core::TagKey;

/// Unique identifier for a node in the graph.
pub type NodeId = NodeIndex;

/// The class inheritance graph.
#[derive(Debug, Default)]
pub struct ClassGraph {
    /// The underlying petgraph graph. Node and edge indexes follow
    /// insertion order.
    pub(crate) graph: DiGraph<GraphNode, Edge>,

    /// Maps string ids to graph node indexes.
    id_index: HashMap<String, NodeId>,

    /// Maps declaring tag keys to graph node indexes.
    keys: KeyIndex,
}

impl ClassGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the node for the class declared at `key`.
    pub fn add_node(&mut self, key: TagKey, node: GraphNode) -> NodeId {
        let id = node.id.clone();
        let index = self.graph.add_node(node);

        self.id_index.insert(id, index);
        self.keys.insert(key, index);

        index
    }

    /// Adds an inheritance edge from `parent` to `child`.
    pub fn add_edge(&mut self, parent: NodeId, child: NodeId, edge: Edge) {
        self.graph.add_edge(parent, child, edge);
    }

    /// Gets a node by its string id.
    pub fn get_by_id(&self, id: &str) -> Option<&GraphNode> {
        let index = self.id_index.get(id)?;
        self.graph.node_weight(*index)
    }

    /// Gets a node by its graph index.
    pub fn get(&self, index: NodeId) -> Option<&GraphNode> {
        self.graph.node_weight(index)
    }

    pub fn get_mut(&mut self, index: NodeId) -> Option<&mut GraphNode> {
        self.graph.node_weight_mut(index)
    }

    /// Gets the node index for the class declared at `key`.
    pub fn index_of(&self, key: TagKey) -> Option<NodeId> {
        self.keys.resolve(key)
    }

    /// Direct parents of a node, in edge insertion order.
    pub fn parents(&self, index: NodeId) -> Vec<&GraphNode> {
        self.neighbors(index, Direction::Incoming)
    }

    /// Direct subclasses of a node, in edge insertion order.
    pub fn children(&self, index: NodeId) -> Vec<&GraphNode> {
        self.neighbors(index, Direction::Outgoing)
    }

    fn neighbors(&self, index: NodeId, direction: Direction) -> Vec<&GraphNode> {
        let mut edges: Vec<_> = self.graph.edges_directed(index, direction).collect();
        edges.sort_by_key(|edge| edge.id());
        edges
            .into_iter()
            .filter_map(|edge| {
                let other = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                self.graph.node_weight(other)
            })
            .collect()
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterates over all nodes in discovery order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Returns all edges with source and target ids for export.
    pub fn export_edges(&self) -> Vec<GraphEdge> {
        self.graph
            .edge_references()
            .filter_map(|edge_ref| {
                let source = self.graph.node_weight(edge_ref.source())?;
                let target = self.graph.node_weight(edge_ref.target())?;
                Some(GraphEdge::new(source.id.clone(), target.id.clone()))
            })
            .collect()
    }

    /// Copies computed positions onto the nodes.
    ///
    /// Nodes the layout does not know keep their current position.
    pub fn apply_layout(&mut self, layout: &Layout) {
        for node in self.graph.node_weights_mut() {
            if let Some(position) = layout.position_of(&node.id) {
                node.position = position;
            }
        }
    }

    /// The read-only view handed to renderers.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes().cloned().collect(),
            edges: self.export_edges(),
        }
    }
}

/// Nodes and edges as seen by an external renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Graph statistics for status output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    /// Files that declare at least one class.
    pub class_files: usize,
}

impl ClassGraph {
    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            class_files: self.keys.file_count(),
        }
    }
}
