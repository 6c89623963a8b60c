//! Error and diagnostic types.
//!
//! Only a malformed envelope is an error. Everything wrong with a single
//! entry inside a well-formed snapshot becomes a [`Diagnostic`]: the entry is
//! skipped and processing continues.

use crate::tag::TagKey;
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Failure to read an event envelope at all.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("invalid event payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read event: {0}")]
    Io(#[from] std::io::Error),
}

/// A skipped entry, recorded during ingestion or graph building.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A map key that should have been a file id or a `[file,index]` pair.
    #[error("malformed key {key:?} in {table}")]
    MalformedKey { table: String, key: String },

    /// A containment entry whose owner is not a discovered class.
    #[error("containment owner {owner} is not a discovered class")]
    UnknownOwner { owner: TagKey },

    /// A containment child that points at no tag.
    #[error("child {child} of {owner} does not resolve to a tag")]
    DanglingChildReference { owner: TagKey, child: TagKey },

    /// An inheritance reference that points at no discovered class.
    #[error("parent {parent} of {child} is not a discovered class")]
    UnresolvedParent { child: TagKey, parent: TagKey },
}

impl Diagnostic {
    pub fn malformed_key(table: &str, key: impl Into<String>) -> Self {
        Diagnostic::MalformedKey {
            table: table.to_string(),
            key: key.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::DanglingChildReference {
            owner: TagKey::new(0, 1),
            child: TagKey::new(99, 0),
        };
        assert_eq!(d.to_string(), "child [99,0] of [0,1] does not resolve to a tag");

        let json = serde_json::to_string(&Diagnostic::malformed_key("tags", "x")).unwrap();
        assert!(json.contains("\"kind\":\"malformed_key\""));
    }
}
