//! Strata Graph - Class graph and layered layout
//!
//! This crate turns the tag tables held by [`strata_core::ProjectState`]
//! into a class inheritance graph and positions every class on a layered
//! canvas.
//!
//! # Architecture
//!
//! ```text
//! ProjectState
//!     │
//!     ├──> ClassGraphBuilder
//!     │      ├─ one node per class tag, id "{file}-{tag index}"
//!     │      ├─ methods/objects attached from the containment index
//!     │      └─ parent → child edges from connected parent references
//!     │
//!     ├──> LayeredLayout
//!     │      ├─ one retained parent per node, cycles broken at local roots
//!     │      └─ levels spaced vertically, nodes centered horizontally
//!     │
//!     └──> GraphSnapshot / export document
//! ```
//!
//! # Example
//!
//! ```
//! use strata_core::{ClassRef, ContainmentIndex, SymbolTag, TagKey, TagStore};
//! use strata_graph::{ClassGraphBuilder, LayeredLayout};
//!
//! let tags: TagStore = [(0, vec![
//!     SymbolTag::class("Animal", vec![]),
//!     SymbolTag::class("Dog", vec![ClassRef::Connected(TagKey::new(0, 0))]),
//! ])].into_iter().collect();
//! let containment = ContainmentIndex::new();
//!
//! let graph = ClassGraphBuilder::new(&tags, &containment).build().graph;
//! let layout = LayeredLayout::default()
//!     .compute(graph.nodes().map(|n| n.id.as_str()), &graph.export_edges());
//!
//! assert_eq!(layout.level_of("0-1"), Some(1));
//! ```

mod builder;
mod edge;
pub mod export;
mod graph;
mod key_index;
mod layout;
mod node;
mod rebuild;

pub use builder::{BuildOutput, ClassGraphBuilder};
pub use edge::{Edge, GraphEdge};
pub use export::ExportError;
pub use graph::{ClassGraph, GraphSnapshot, GraphStats, NodeId};
pub use key_index::KeyIndex;
pub use layout::{LayeredLayout, Layout, LayoutConfig, LayoutSlot};
pub use node::{GraphNode, MethodSummary, ObjectSummary, Position};
pub use rebuild::Rebuild;
