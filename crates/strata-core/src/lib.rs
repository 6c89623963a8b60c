//! Strata Core - Tag data model and ingestion
//!
//! This crate holds what the external indexer tells us about a project:
//! per-file symbol tags, the containment relation between them, and the
//! scope tables. Indexer events are merged into a [`ProjectState`], which
//! graph building then reads.
//!
//! # Example
//!
//! ```
//! use strata_core::{IndexerEvent, ProjectState};
//!
//! let event = IndexerEvent::from_json(r#"{
//!     "event": "project_structure",
//!     "payload": {
//!         "files": ["zoo.cpp"],
//!         "imports": {},
//!         "tags": {"0": [{"Class": {"name": "Animal", "parents": []}}]},
//!         "containment": {}
//!     }
//! }"#).unwrap();
//!
//! let mut state = ProjectState::new();
//! state.apply(event);
//! assert_eq!(state.tags().tag_count(), 1);
//! ```

mod error;
pub mod languages;
mod snapshot;
mod state;
mod store;
mod tag;

pub use error::{Diagnostic, IngestError, Result};
pub use snapshot::{
    parse_file_id, parse_tag_key, IndexerEvent, IntenseData, Progress, ProjectStructure,
};
pub use state::{Change, ProjectState};
pub use store::{ConnectableSymbols, ContainmentIndex, CustomClass, ScopeId, ScopeTables, TagStore};
pub use tag::{ClassRef, FileId, SymbolTag, TagKey};
