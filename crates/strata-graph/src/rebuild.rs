//! Full recompute of derived state.

use crate::builder::ClassGraphBuilder;
use crate::graph::{ClassGraph, GraphSnapshot, GraphStats};
use crate::layout::{LayeredLayout, Layout, LayoutConfig};
use std::time::Instant;
use strata_core::{Diagnostic, ProjectState};
use tracing::info;

/// Everything derived from one project state.
#[derive(Debug, Default)]
pub struct Rebuild {
    pub graph: ClassGraph,
    pub layout: Layout,
    pub diagnostics: Vec<Diagnostic>,
}

impl Rebuild {
    /// Builds the class graph and lays it out.
    ///
    /// Nothing is patched: the graph, member lists and positions are
    /// recomputed from scratch on every call.
    pub fn run(state: &ProjectState, config: &LayoutConfig) -> Self {
        let start = Instant::now();

        let output = ClassGraphBuilder::from_state(state).build();
        let mut graph = output.graph;

        let edges = graph.export_edges();
        let ids = graph.nodes().map(|node| node.id.as_str());
        let layout = LayeredLayout::new(*config).compute(ids, &edges);
        graph.apply_layout(&layout);

        info!(
            "Rebuilt class graph in {:?} ({} classes, {} inheritance edges, {} levels)",
            start.elapsed(),
            graph.node_count(),
            graph.edge_count(),
            layout.levels().len()
        );

        Self {
            graph,
            layout,
            diagnostics: output.diagnostics,
        }
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.graph.snapshot()
    }

    pub fn stats(&self) -> GraphStats {
        self.graph.stats()
    }
}
