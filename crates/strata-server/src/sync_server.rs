//! Real-time sync server.
//!
//! Hosts a WebSocket endpoint shared by two kinds of clients: indexers push
//! `IndexerEvent` frames in, renderers receive graph snapshots out. A single
//! event loop applies events to the session in arrival order and broadcasts
//! the result to every connection.

use crate::session::{BroadcastMessage, Session, SessionState};
use crate::{Result, ServerError};
use futures_util::{SinkExt, StreamExt};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use strata_core::IndexerEvent;
use strata_graph::LayoutConfig;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the sync server.
#[derive(Debug, Clone)]
pub struct SyncServerConfig {
    /// Address to bind the WebSocket server.
    pub addr: SocketAddr,
    /// Directory of event files to watch, if any.
    pub watch_path: Option<PathBuf>,
    /// Debounce duration for file events.
    pub debounce_ms: u64,
    /// Layout spacing for rebuilt graphs.
    pub layout: LayoutConfig,
}

impl Default for SyncServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            watch_path: None,
            debounce_ms: 150,
            layout: LayoutConfig::default(),
        }
    }
}

/// Requests a renderer may send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Re-send the current snapshot to this client only.
    RequestSnapshot,
}

/// Any text frame a client may send.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Incoming {
    Event(IndexerEvent),
    Client(ClientMessage),
}

// ─────────────────────────────────────────────────────────────────────────────
// SyncServer
// ─────────────────────────────────────────────────────────────────────────────

/// WebSocket server around one session.
pub struct SyncServer {
    config: SyncServerConfig,
    session: Session,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
    events_tx: mpsc::Sender<IndexerEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<IndexerEvent>>>,
}

impl SyncServer {
    /// Creates a sync server with an empty session.
    pub fn new(config: SyncServerConfig) -> Self {
        let session = Session::new(config.layout);
        Self::with_session(config, session)
    }

    /// Creates a sync server around already ingested state.
    ///
    /// The state keeps the layout spacing it was created with.
    pub fn with_state(config: SyncServerConfig, state: SessionState) -> Self {
        Self::with_session(config, Session::from_state(state))
    }

    fn with_session(config: SyncServerConfig, session: Session) -> Self {
        let (broadcast_tx, _) = broadcast::channel(256);
        let (events_tx, events_rx) = mpsc::channel(256);

        Self {
            config,
            session,
            broadcast_tx,
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    pub fn session(&self) -> Session {
        self.session.clone()
    }

    /// Returns a broadcast receiver for server messages.
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastMessage> {
        self.broadcast_tx.subscribe()
    }

    /// Binds the configured address and serves until the process exits.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        self.serve(listener).await
    }

    /// Serves on an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let events_rx = self
            .events_rx
            .lock()
            .await
            .take()
            .ok_or(ServerError::AlreadyRunning)?;

        let session = self.session.clone();
        let broadcast_tx = self.broadcast_tx.clone();
        tokio::spawn(async move {
            run_event_loop(events_rx, session, broadcast_tx).await;
        });

        if let Some(watch_path) = self.config.watch_path.clone() {
            let debounce_ms = self.config.debounce_ms;
            let events_tx = self.events_tx.clone();
            tokio::spawn(async move {
                if let Err(e) = run_file_watcher(watch_path, debounce_ms, events_tx).await {
                    error!("File watcher error: {}", e);
                }
            });
        }

        info!("WebSocket server listening on ws://{}", listener.local_addr()?);
        if let Some(path) = &self.config.watch_path {
            info!("Watching {} (debounce {}ms)", path.display(), self.config.debounce_ms);
        }

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let client_id = Uuid::new_v4();
                    info!("New connection {} from {}", client_id, addr);

                    let session = self.session.clone();
                    let broadcast_rx = self.broadcast_tx.subscribe();
                    let events_tx = self.events_tx.clone();

                    tokio::spawn(async move {
                        let result = handle_client(
                            stream,
                            client_id,
                            session,
                            broadcast_rx,
                            events_tx,
                        )
                        .await;
                        if let Err(e) = result {
                            warn!("Connection error from {}: {}", client_id, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client Connection Handler
// ─────────────────────────────────────────────────────────────────────────────

async fn snapshot_frame(session: &Session) -> Result<Message> {
    let update = BroadcastMessage::GraphUpdate(session.graph_update().await);
    Ok(Message::Text(serde_json::to_string(&update)?))
}

/// Handles a single WebSocket client connection.
async fn handle_client(
    stream: TcpStream,
    client_id: Uuid,
    session: Session,
    mut broadcast_rx: broadcast::Receiver<BroadcastMessage>,
    events_tx: mpsc::Sender<IndexerEvent>,
) -> Result<()> {
    let ws_stream = accept_async(stream).await?;
    let (mut write, mut read) = ws_stream.split();

    write.send(snapshot_frame(&session).await?).await?;
    debug!("Sent initial snapshot to {}", client_id);

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match serde_json::from_str::<Incoming>(&text) {
                        Ok(Incoming::Event(event)) => {
                            debug!("Received {} event from {}", event.name(), client_id);
                            if events_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Ok(Incoming::Client(ClientMessage::RequestSnapshot)) => {
                            write.send(snapshot_frame(&session).await?).await?;
                        }
                        Err(e) => {
                            warn!("Ignoring unreadable frame from {}: {}", client_id, e);
                        }
                    },
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", client_id);
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("Error from {}: {}", client_id, e);
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }

            msg = broadcast_rx.recv() => {
                match msg {
                    Ok(broadcast) => {
                        let json = serde_json::to_string(&broadcast)?;
                        if write.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Later snapshots supersede the skipped ones.
                        warn!("Client {} lagged by {} messages", client_id, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        }
    }

    info!("Connection closed: {}", client_id);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Event Loop
// ─────────────────────────────────────────────────────────────────────────────

/// Applies events one at a time and broadcasts each outcome.
async fn run_event_loop(
    mut rx: mpsc::Receiver<IndexerEvent>,
    session: Session,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
) {
    info!("Event loop started");

    while let Some(event) = rx.recv().await {
        let start = Instant::now();
        let name = event.name();
        let message = session.apply(event).await;

        if let BroadcastMessage::GraphUpdate(update) = &message {
            info!(
                "Rebuilt after {} in {:?} (revision {}, {} nodes, {} edges)",
                name,
                start.elapsed(),
                update.revision,
                update.node_count,
                update.edge_count
            );
        }

        // No connected clients is not an error.
        let _ = broadcast_tx.send(message);
    }

    debug!("Event loop stopped");
}

// ─────────────────────────────────────────────────────────────────────────────
// File Watcher with Debouncing
// ─────────────────────────────────────────────────────────────────────────────

/// Watches a directory and feeds changed event files to the event loop.
async fn run_file_watcher(
    watch_path: PathBuf,
    debounce_ms: u64,
    tx: mpsc::Sender<IndexerEvent>,
) -> Result<()> {
    let (notify_tx, mut notify_rx) = mpsc::channel::<notify::Result<Event>>(256);

    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = notify_tx.blocking_send(res);
        },
        Config::default(),
    )?;

    watcher.watch(&watch_path, RecursiveMode::NonRecursive)?;
    info!("File watcher started for {}", watch_path.display());

    let mut pending: HashMap<PathBuf, Instant> = HashMap::new();
    let debounce_dur = Duration::from_millis(debounce_ms);

    loop {
        let now = Instant::now();
        let mut ready: Vec<PathBuf> = pending
            .iter()
            .filter(|(_, time)| now.duration_since(**time) >= debounce_dur)
            .map(|(path, _)| path.clone())
            .collect();
        ready.sort();

        for path in ready {
            pending.remove(&path);
            if !path.exists() {
                debug!("Ignoring removed file {}", path.display());
                continue;
            }

            match load_events(&path).await {
                Ok(events) => {
                    info!("Loaded {} events from {}", events.len(), path.display());
                    for event in events {
                        if tx.send(event).await.is_err() {
                            return Ok(());
                        }
                    }
                }
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        match tokio::time::timeout(Duration::from_millis(50), notify_rx.recv()).await {
            Ok(Some(Ok(event))) => {
                for path in event.paths {
                    if should_process_file(&path) {
                        pending.insert(path, Instant::now());
                    }
                }
            }
            Ok(Some(Err(e))) => {
                warn!("Watch error: {}", e);
            }
            Ok(None) => break,
            Err(_) => {}
        }
    }

    Ok(())
}

/// Only JSON files carry events.
fn should_process_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

async fn load_events(path: &Path) -> Result<Vec<IndexerEvent>> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(IndexerEvent::batch_from_json(&text)?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Progress;

    const STRUCTURE: &str = r#"{"event":"project_structure","payload":{
        "tags": {"0": [
            {"Class": {"name": "Animal", "parents": []}},
            {"Class": {"name": "Dog", "parents": [{"Connected": [0, 0]}]}}
        ]}
    }}"#;

    #[test]
    fn test_should_process_file() {
        assert!(should_process_file(Path::new("snapshot.json")));
        assert!(should_process_file(Path::new("dir/EVENTS.JSON")));
        assert!(!should_process_file(Path::new("main.cpp")));
        assert!(!should_process_file(Path::new("README")));
    }

    #[test]
    fn test_incoming_frames() {
        let frame: Incoming = serde_json::from_str(r#"{"type":"RequestSnapshot"}"#).unwrap();
        assert!(matches!(frame, Incoming::Client(ClientMessage::RequestSnapshot)));

        let frame: Incoming = serde_json::from_str(STRUCTURE).unwrap();
        assert!(matches!(frame, Incoming::Event(IndexerEvent::ProjectStructure(_))));

        let frame: Incoming =
            serde_json::from_str(r#"{"event":"progress","payload":["tags",50]}"#).unwrap();
        assert!(matches!(frame, Incoming::Event(IndexerEvent::Progress(_))));

        assert!(serde_json::from_str::<Incoming>(r#"{"type":"Unknown"}"#).is_err());
    }

    #[tokio::test]
    async fn test_load_events_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(
            &path,
            format!(r#"[{}, {{"event":"progress","payload":["done",100]}}]"#, STRUCTURE),
        )
        .unwrap();

        let events = load_events(&path).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].name(), "progress");
    }

    #[tokio::test]
    async fn test_event_loop_broadcasts_in_order() {
        let session = Session::new(LayoutConfig::default());
        let (events_tx, events_rx) = mpsc::channel(8);
        let (broadcast_tx, mut broadcast_rx) = broadcast::channel(8);
        tokio::spawn(run_event_loop(events_rx, session.clone(), broadcast_tx));

        events_tx
            .send(IndexerEvent::Progress(Progress {
                phase: "tags".into(),
                percent: 10.0,
            }))
            .await
            .unwrap();
        events_tx.send(IndexerEvent::from_json(STRUCTURE).unwrap()).await.unwrap();

        assert!(matches!(broadcast_rx.recv().await.unwrap(), BroadcastMessage::Progress(_)));
        match broadcast_rx.recv().await.unwrap() {
            BroadcastMessage::GraphUpdate(update) => {
                assert_eq!(update.revision, 1);
                assert_eq!(update.node_count, 2);
                assert_eq!(update.edge_count, 1);
            }
            other => panic!("unexpected message: {:?}", other),
        }
        assert_eq!(session.read().await.revision(), 1);
    }

    #[tokio::test]
    async fn test_serve_twice_fails() {
        let server = SyncServer::new(SyncServerConfig::default());
        // Take the receiver as a first run would.
        server.events_rx.lock().await.take();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        assert!(matches!(server.serve(listener).await, Err(ServerError::AlreadyRunning)));
    }

    #[tokio::test]
    async fn test_watched_json_file_triggers_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let server = SyncServer::new(SyncServerConfig {
            watch_path: Some(dir.path().to_path_buf()),
            debounce_ms: 50,
            ..SyncServerConfig::default()
        });
        let mut updates = server.subscribe();
        let session = server.session();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        tokio::spawn(async move { server.serve(listener).await });
        // let the watcher register before touching the directory
        tokio::time::sleep(Duration::from_millis(300)).await;

        std::fs::write(dir.path().join("notes.txt"), STRUCTURE).unwrap();
        std::fs::write(dir.path().join("structure.json"), STRUCTURE).unwrap();

        let message = tokio::time::timeout(Duration::from_secs(5), updates.recv())
            .await
            .expect("no update from watched file")
            .unwrap();
        match message {
            BroadcastMessage::GraphUpdate(update) => {
                assert_eq!(update.revision, 1);
                assert_eq!(update.node_count, 2);
            }
            other => panic!("unexpected message: {:?}", other),
        }

        // the .txt file never reaches the event loop
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(updates.try_recv().is_err());
        assert_eq!(session.read().await.revision(), 1);
    }
}
