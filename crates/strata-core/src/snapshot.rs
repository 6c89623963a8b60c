//! Wire payloads delivered by the indexer.
//!
//! Map keys arrive as strings (`"3"` for a file id, `"[3,1]"` for a tag key)
//! and are kept raw here. They are parsed during ingestion so that a bad key
//! drops only its own entry.

use crate::error::Result;
use crate::store::ConnectableSymbols;
use crate::tag::{FileId, SymbolTag, TagKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// The `project_structure` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProjectStructureWire")]
pub struct ProjectStructure {
    /// Indexed file paths. A file's position is its file id.
    pub files: Vec<String>,
    pub imports: BTreeMap<String, Vec<FileId>>,
    pub tags: BTreeMap<String, Vec<SymbolTag>>,
    pub containment: BTreeMap<String, Vec<TagKey>>,
}

/// The indexer sends either named fields or a positional 4-tuple.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectStructureWire {
    Named {
        #[serde(default)]
        files: Vec<String>,
        #[serde(default)]
        imports: BTreeMap<String, Vec<FileId>>,
        #[serde(default)]
        tags: BTreeMap<String, Vec<SymbolTag>>,
        #[serde(default)]
        containment: BTreeMap<String, Vec<TagKey>>,
    },
    Positional(
        Vec<String>,
        BTreeMap<String, Vec<FileId>>,
        BTreeMap<String, Vec<SymbolTag>>,
        BTreeMap<String, Vec<TagKey>>,
    ),
}

impl From<ProjectStructureWire> for ProjectStructure {
    fn from(wire: ProjectStructureWire) -> Self {
        match wire {
            ProjectStructureWire::Named {
                files,
                imports,
                tags,
                containment,
            }
            | ProjectStructureWire::Positional(files, imports, tags, containment) => Self {
                files,
                imports,
                tags,
                containment,
            },
        }
    }
}

/// The `intense_data` event: custom types and scope visibility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntenseData {
    #[serde(default, alias = "customClasses")]
    pub custom_classes: BTreeMap<String, Vec<(String, usize)>>,

    #[serde(default, alias = "accessibleScopes")]
    pub accessible_scopes: BTreeMap<String, BTreeMap<String, Vec<TagKey>>>,

    #[serde(default, rename = "scoped_connectable_s", alias = "scopedConnectable")]
    pub scoped_connectable: BTreeMap<String, BTreeMap<String, ConnectableSymbols>>,
}

/// The `progress` event, `[label, percent]` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, f64)", into = "(String, f64)")]
pub struct Progress {
    pub phase: String,
    pub percent: f64,
}

impl From<(String, f64)> for Progress {
    fn from((phase, percent): (String, f64)) -> Self {
        Self { phase, percent }
    }
}

impl From<Progress> for (String, f64) {
    fn from(progress: Progress) -> Self {
        (progress.phase, progress.percent)
    }
}

/// One event from the indexer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum IndexerEvent {
    ProjectStructure(ProjectStructure),
    IntenseData(IntenseData),
    Progress(Progress),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventBatch {
    Many(Vec<IndexerEvent>),
    One(IndexerEvent),
}

impl IndexerEvent {
    /// Parses a single framed event.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parses a single event or an array of events.
    pub fn batch_from_json(text: &str) -> Result<Vec<Self>> {
        Ok(match serde_json::from_str(text)? {
            EventBatch::Many(events) => events,
            EventBatch::One(event) => vec![event],
        })
    }

    /// Reads every event stored in a file.
    pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        let text = fs::read_to_string(path)?;
        Self::batch_from_json(&text)
    }

    pub fn name(&self) -> &'static str {
        match self {
            IndexerEvent::ProjectStructure(_) => "project_structure",
            IndexerEvent::IntenseData(_) => "intense_data",
            IndexerEvent::Progress(_) => "progress",
        }
    }
}

/// Parses a file id key such as `"3"`.
pub fn parse_file_id(key: &str) -> Option<FileId> {
    key.trim().parse().ok()
}

/// Parses a composite tag key such as `"[3,1]"`.
pub fn parse_tag_key(key: &str) -> Option<TagKey> {
    serde_json::from_str::<(usize, usize)>(key.trim())
        .ok()
        .map(TagKey::from)
}
