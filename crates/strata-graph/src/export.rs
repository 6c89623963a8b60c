//! Standalone export document.
//!
//! A template carries two placeholder markers that are replaced by the JSON
//! encodings of the snapshot's nodes and edges. The bundled template is a
//! self-contained HTML page; callers may supply their own.

use crate::graph::GraphSnapshot;
use std::io::{self, Write};
use thiserror::Error;
use tracing::debug;

/// Replaced by the JSON array of nodes.
pub const NODES_PLACEHOLDER: &str = "__STRATA_NODES__";

/// Replaced by the JSON array of edges.
pub const EDGES_PLACEHOLDER: &str = "__STRATA_EDGES__";

/// The bundled HTML viewer.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/graph.html");

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("template has no {0} placeholder")]
    MissingPlaceholder(&'static str),
}

/// Substitutes the snapshot into `template`.
pub fn render(snapshot: &GraphSnapshot, template: &str) -> Result<String, ExportError> {
    for placeholder in [NODES_PLACEHOLDER, EDGES_PLACEHOLDER] {
        if !template.contains(placeholder) {
            return Err(ExportError::MissingPlaceholder(placeholder));
        }
    }

    let nodes = script_safe_json(&snapshot.nodes)?;
    let edges = script_safe_json(&snapshot.edges)?;

    debug!(
        "Rendering export with {} nodes and {} edges",
        snapshot.nodes.len(),
        snapshot.edges.len()
    );

    // Single pass over the template; inserted JSON is never rescanned.
    let substitutions = [
        (NODES_PLACEHOLDER, nodes.as_str()),
        (EDGES_PLACEHOLDER, edges.as_str()),
    ];
    let mut out = String::with_capacity(template.len() + nodes.len() + edges.len());
    let mut rest = template;

    while let Some((at, marker, value)) = substitutions
        .iter()
        .filter_map(|(marker, value)| rest.find(marker).map(|at| (at, *marker, *value)))
        .min_by_key(|(at, _, _)| *at)
    {
        out.push_str(&rest[..at]);
        out.push_str(value);
        rest = &rest[at + marker.len()..];
    }
    out.push_str(rest);

    Ok(out)
}

/// Renders the snapshot into `template` and writes it out.
pub fn write_document(
    snapshot: &GraphSnapshot,
    template: &str,
    mut output: impl Write,
) -> Result<(), ExportError> {
    let rendered = render(snapshot, template)?;
    output.write_all(rendered.as_bytes())?;
    output.flush()?;
    Ok(())
}

// Embedded inside <script>, so "</" must not appear literally.
fn script_safe_json<T: serde::Serialize>(value: &T) -> Result<String, ExportError> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::GraphEdge;
    use crate::node::GraphNode;

    fn snapshot() -> GraphSnapshot {
        GraphSnapshot {
            nodes: vec![GraphNode::new("0-0", "Animal"), GraphNode::new("0-1", "</script>")],
            edges: vec![GraphEdge::new("0-0", "0-1")],
        }
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let out = render(&snapshot(), "N=__STRATA_NODES__;E=__STRATA_EDGES__").unwrap();

        assert!(out.contains(r#""displayName":"Animal""#));
        assert!(out.contains(r#"E=[{"source":"0-0","target":"0-1"}]"#));
        assert!(!out.contains(NODES_PLACEHOLDER));
        assert!(!out.contains("</script>"));
    }

    #[test]
    fn test_class_named_like_a_marker() {
        for name in [NODES_PLACEHOLDER, EDGES_PLACEHOLDER] {
            let snapshot = GraphSnapshot {
                nodes: vec![GraphNode::new("0-0", name)],
                edges: vec![GraphEdge::new("0-0", "0-0")],
            };

            let out = render(&snapshot, "N=__STRATA_NODES__\nE=__STRATA_EDGES__").unwrap();
            let (nodes, edges) = out.split_once('\n').unwrap();

            let nodes: Vec<GraphNode> =
                serde_json::from_str(nodes.trim_start_matches("N=")).unwrap();
            let edges: Vec<GraphEdge> =
                serde_json::from_str(edges.trim_start_matches("E=")).unwrap();
            assert_eq!(nodes[0].display_name, name);
            assert_eq!(edges, snapshot.edges);
        }
    }

    #[test]
    fn test_repeated_markers_are_all_replaced() {
        let template = "__STRATA_EDGES__|__STRATA_NODES__|__STRATA_EDGES__";
        let out = render(&snapshot(), template).unwrap();
        assert_eq!(out.matches(r#"{"source":"0-0","target":"0-1"}"#).count(), 2);
        assert!(!out.contains(EDGES_PLACEHOLDER));
    }

    #[test]
    fn test_missing_placeholder() {
        let err = render(&snapshot(), "only __STRATA_NODES__").unwrap_err();
        assert!(matches!(err, ExportError::MissingPlaceholder(EDGES_PLACEHOLDER)));
    }

    #[test]
    fn test_default_template_round_trip() {
        let mut buf = Vec::new();
        write_document(&snapshot(), DEFAULT_TEMPLATE, &mut buf).unwrap();
        let html = String::from_utf8(buf).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("const edges = [{"));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.html");
        let file = std::fs::File::create(&path).unwrap();

        write_document(&snapshot(), DEFAULT_TEMPLATE, file).unwrap();

        assert!(std::fs::read_to_string(&path).unwrap().contains("Animal"));
    }
}
