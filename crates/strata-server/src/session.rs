//! Session state shared between the event loop and connected clients.
//!
//! One `SessionState` owns the ingested tables and everything derived from
//! them. Applying an event merges it and, when the tables changed, rebuilds
//! the graph and layout before returning. Callers hold the write lock for
//! the whole call, so readers see either the old or the new snapshot.

use serde::Serialize;
use std::sync::Arc;
use strata_core::{Change, Diagnostic, IndexerEvent, ProjectState, Progress};
use strata_graph::{GraphEdge, GraphNode, GraphSnapshot, GraphStats, LayoutConfig, Rebuild};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::debug;

/// Shared session state across tasks.
type SharedSession = Arc<RwLock<SessionState>>;

/// Owned handle to one session.
///
/// Cloning is cheap; every clone sees the same state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: SharedSession,
}

impl Session {
    pub fn new(layout: LayoutConfig) -> Self {
        Self::from_state(SessionState::new(layout))
    }

    pub fn from_state(state: SessionState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Merges, rebuilds and lays out under one write lock.
    pub async fn apply(&self, event: IndexerEvent) -> BroadcastMessage {
        let mut state = self.inner.write().await;
        let change = state.apply(event);
        state.message_for(change)
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.inner.read().await
    }

    /// Full snapshot message for the current revision.
    pub async fn graph_update(&self) -> GraphUpdatePayload {
        self.inner.read().await.graph_update()
    }
}

/// Ingested tables plus the derived graph.
#[derive(Debug, Default)]
pub struct SessionState {
    project: ProjectState,
    layout: LayoutConfig,
    snapshot: GraphSnapshot,
    stats: GraphStats,
    build_diagnostics: Vec<Diagnostic>,
    revision: u64,
}

impl SessionState {
    pub fn new(layout: LayoutConfig) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    /// Merges an event and rebuilds derived state if needed.
    pub fn apply(&mut self, event: IndexerEvent) -> Change {
        debug!("Applying {} event", event.name());
        let change = self.project.apply(event);
        if change.needs_rebuild() {
            self.rebuild();
        }
        change
    }

    fn rebuild(&mut self) {
        let rebuild = Rebuild::run(&self.project, &self.layout);
        self.snapshot = rebuild.snapshot();
        self.stats = rebuild.stats();
        self.build_diagnostics = rebuild.diagnostics;
        self.revision += 1;
    }

    /// The message that tells clients about `change`.
    pub fn message_for(&self, change: Change) -> BroadcastMessage {
        match change {
            Change::Progress => {
                let progress = self.project.progress().cloned().unwrap_or(Progress {
                    phase: String::new(),
                    percent: 0.0,
                });
                BroadcastMessage::Progress(ProgressPayload::from(progress))
            }
            Change::Structure | Change::Scopes => {
                BroadcastMessage::GraphUpdate(self.graph_update())
            }
        }
    }

    /// Full snapshot message for the current revision.
    pub fn graph_update(&self) -> GraphUpdatePayload {
        GraphUpdatePayload {
            revision: self.revision,
            node_count: self.stats.node_count,
            edge_count: self.stats.edge_count,
            file_count: self.project.files().len(),
            diagnostic_count: self.diagnostics().count(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            nodes: self.snapshot.nodes.clone(),
            edges: self.snapshot.edges.clone(),
        }
    }

    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    pub fn stats(&self) -> GraphStats {
        self.stats
    }

    pub fn project(&self) -> &ProjectState {
        &self.project
    }

    /// Number of rebuilds so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Ingestion diagnostics followed by build diagnostics.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.project
            .diagnostics()
            .chain(self.build_diagnostics.iter())
    }
}

/// Server messages broadcast to all connected clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum BroadcastMessage {
    /// Full graph snapshot after a rebuild.
    GraphUpdate(GraphUpdatePayload),
    /// Indexer progress, forwarded as received.
    Progress(ProgressPayload),
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphUpdatePayload {
    /// Increments on every rebuild.
    pub revision: u64,
    pub node_count: usize,
    pub edge_count: usize,
    /// Indexed files, whether or not they declare classes.
    pub file_count: usize,
    pub diagnostic_count: usize,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressPayload {
    pub phase: String,
    pub percent: f64,
}

impl From<Progress> for ProgressPayload {
    fn from(progress: Progress) -> Self {
        Self {
            phase: progress.phase,
            percent: progress.percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure_event() -> IndexerEvent {
        IndexerEvent::from_json(
            r#"{"event":"project_structure","payload":{
                "files": ["a.cpp"],
                "tags": {"0": [
                    {"Class": {"name": "Base", "parents": []}},
                    {"Class": {"name": "Derived", "parents": [{"Connected": [0, 0]}]}}
                ]},
                "containment": {"[0,7]": [[0, 1]]}
            }}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_structure_event_rebuilds() {
        let mut state = SessionState::new(LayoutConfig::default());
        let change = state.apply(structure_event());

        assert_eq!(change, Change::Structure);
        assert_eq!(state.revision(), 1);
        assert_eq!(state.snapshot().nodes.len(), 2);
        assert_eq!(state.snapshot().nodes[1].position.y, 200.0);
        // [0,7] is not a class
        assert_eq!(state.diagnostics().count(), 1);
    }

    #[test]
    fn test_progress_does_not_rebuild() {
        let mut state = SessionState::new(LayoutConfig::default());
        let change = state.apply(IndexerEvent::Progress(Progress {
            phase: "tags".into(),
            percent: 30.0,
        }));

        assert_eq!(state.revision(), 0);
        let json = serde_json::to_string(&state.message_for(change)).unwrap();
        assert_eq!(json, r#"{"type":"Progress","payload":{"phase":"tags","percent":30.0}}"#);
    }

    #[test]
    fn test_graph_update_message() {
        let mut state = SessionState::new(LayoutConfig::default());
        let change = state.apply(structure_event());

        let json = serde_json::to_value(state.message_for(change)).unwrap();
        assert_eq!(json["type"], "GraphUpdate");
        assert_eq!(json["payload"]["node_count"], 2);
        assert_eq!(json["payload"]["file_count"], 1);
        assert_eq!(json["payload"]["edges"][0]["source"], "0-0");
    }

    #[tokio::test]
    async fn test_session_apply_is_visible_to_readers() {
        let session = Session::new(LayoutConfig::default());
        let reader = session.clone();

        let message = session.apply(structure_event()).await;

        assert!(matches!(
            message,
            BroadcastMessage::GraphUpdate(ref update) if update.revision == 1
        ));
        let state = reader.read().await;
        assert_eq!(state.stats().node_count, 2);
        assert_eq!(state.project().file_path(0), Some("a.cpp"));
    }
}
