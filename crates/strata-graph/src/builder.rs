//! Class graph builder.
//!
//! Derives the class graph from the tag store and the containment index in
//! three passes:
//! 1. Discover a node for every class tag
//! 2. Attach contained functions and objects as members
//! 3. Resolve connected parent references into inheritance edges
//!
//! The builder is a pure function of its inputs. Entries that cannot be
//! resolved are skipped and reported as diagnostics.

use crate::edge::Edge;
use crate::graph::ClassGraph;
use crate::node::{GraphNode, MethodSummary, ObjectSummary};
use strata_core::{
    languages, ClassRef, ContainmentIndex, Diagnostic, ProjectState, SymbolTag, TagKey, TagStore,
};
use tracing::{debug, warn};

/// Result of one build.
#[derive(Debug, Default)]
pub struct BuildOutput {
    pub graph: ClassGraph,
    pub diagnostics: Vec<Diagnostic>,
}

/// Builds a [`ClassGraph`] from indexed tags.
pub struct ClassGraphBuilder<'a> {
    tags: &'a TagStore,
    containment: &'a ContainmentIndex,
    /// File paths by file id, used for node paths and built-in type names.
    files: &'a [String],
}

impl<'a> ClassGraphBuilder<'a> {
    /// Creates a builder over a tag store and containment index.
    pub fn new(tags: &'a TagStore, containment: &'a ContainmentIndex) -> Self {
        Self {
            tags,
            containment,
            files: &[],
        }
    }

    /// Creates a builder over the current project state.
    pub fn from_state(state: &'a ProjectState) -> Self {
        Self::new(state.tags(), state.containment()).with_files(state.files())
    }

    pub fn with_files(mut self, files: &'a [String]) -> Self {
        self.files = files;
        self
    }

    /// Runs all three passes and returns the graph.
    pub fn build(&self) -> BuildOutput {
        let mut output = BuildOutput::default();

        self.discover_nodes(&mut output.graph);
        self.attach_members(&mut output.graph, &mut output.diagnostics);
        self.resolve_edges(&mut output.graph, &mut output.diagnostics);

        debug!(
            "Built class graph: {} nodes, {} edges, {} diagnostics",
            output.graph.node_count(),
            output.graph.edge_count(),
            output.diagnostics.len()
        );

        output
    }

    fn discover_nodes(&self, graph: &mut ClassGraph) {
        for (key, tag) in self.tags.classes() {
            let node = GraphNode::new(key.node_id(), tag.name())
                .with_file(self.file_path(key.file).map(str::to_string));
            graph.add_node(key, node);
        }
    }

    fn attach_members(&self, graph: &mut ClassGraph, diagnostics: &mut Vec<Diagnostic>) {
        for (owner, children) in self.containment.iter() {
            let Some(index) = graph.index_of(owner) else {
                let diagnostic = Diagnostic::UnknownOwner { owner };
                warn!("{}", diagnostic);
                diagnostics.push(diagnostic);
                continue;
            };

            let mut methods = Vec::new();
            let mut objects = Vec::new();

            for &child in children {
                match self.tags.get(child) {
                    Some(SymbolTag::Function { name, class }) => methods.push(MethodSummary {
                        name: name.clone(),
                        return_type: self.type_name(child, class.as_ref()),
                    }),
                    Some(SymbolTag::Object { name, class }) => objects.push(ObjectSummary {
                        name: name.clone(),
                        type_name: self.type_name(child, class.as_ref()),
                    }),
                    Some(SymbolTag::Class { name, .. }) => {
                        debug!("Ignoring nested class {} inside {}", name, owner);
                    }
                    None => {
                        let diagnostic = Diagnostic::DanglingChildReference { owner, child };
                        warn!("{}", diagnostic);
                        diagnostics.push(diagnostic);
                    }
                }
            }

            if let Some(node) = graph.get_mut(index) {
                node.methods = methods;
                node.objects = objects;
            }
        }
    }

    fn resolve_edges(&self, graph: &mut ClassGraph, diagnostics: &mut Vec<Diagnostic>) {
        // Collect first; the graph cannot be borrowed while edges are added.
        let mut edges_to_add = Vec::new();

        for (child, tag) in self.tags.classes() {
            let Some(child_index) = graph.index_of(child) else {
                continue;
            };

            for (slot, parent) in tag.parents().iter().enumerate() {
                let Some(parent_key) = parent.connected() else {
                    continue;
                };

                match graph.index_of(parent_key) {
                    Some(parent_index) => {
                        edges_to_add.push((parent_index, child_index, Edge::new(slot)))
                    }
                    None => {
                        let diagnostic = Diagnostic::UnresolvedParent {
                            child,
                            parent: parent_key,
                        };
                        debug!("{}", diagnostic);
                        diagnostics.push(diagnostic);
                    }
                }
            }
        }

        for (parent, child, edge) in edges_to_add {
            graph.add_edge(parent, child, edge);
        }
    }

    /// Display name for a member's type reference.
    fn type_name(&self, member: TagKey, class: Option<&ClassRef>) -> Option<String> {
        match class? {
            ClassRef::Undiscovered(name) => Some(name.clone()),
            ClassRef::Connected(key) => self.tags.get(*key).map(|tag| tag.name().to_string()),
            ClassRef::DataType(id) => {
                let path = self.file_path(member.file)?;
                languages::data_type_name(path, *id).map(str::to_string)
            }
        }
    }

    fn file_path(&self, file: usize) -> Option<&'a str> {
        self.files.get(file).map(String::as_str)
    }
}
