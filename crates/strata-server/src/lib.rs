//! Strata Server - live class graph sessions
//!
//! This crate owns a session (ingested tables plus the derived graph) and
//! serves it over WebSocket:
//! - One event loop is the only writer; every event is merged and the graph
//!   rebuilt under a single write lock
//! - Renderers receive a full snapshot on connect and after every rebuild
//! - Indexers push events as text frames, or drop JSON files into a watched
//!   directory

use thiserror::Error;

mod session;
pub mod sync_server;

pub use session::{BroadcastMessage, GraphUpdatePayload, ProgressPayload, Session, SessionState};
pub use sync_server::{ClientMessage, SyncServer, SyncServerConfig};

/// Errors raised while serving a session.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read events: {0}")]
    Ingest(#[from] strata_core::IngestError),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Sync server is already running")]
    AlreadyRunning,
}

pub type Result<T> = std::result::Result<T, ServerError>;
