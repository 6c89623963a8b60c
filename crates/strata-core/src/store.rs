//! In-memory tables populated by ingestion.
//!
//! All maps are ordered by key so that anything derived from them
//! (graph node order, edge order) is deterministic.

use crate::tag::{FileId, SymbolTag, TagKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-file ordered symbol tags. The ground truth for symbol existence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagStore {
    files: BTreeMap<FileId, Vec<SymbolTag>>,
}

impl TagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the tags of one file.
    pub fn insert_file(&mut self, file: FileId, tags: Vec<SymbolTag>) {
        self.files.insert(file, tags);
    }

    /// Looks up a tag; `None` for a missing file or an out-of-range index.
    pub fn get(&self, key: TagKey) -> Option<&SymbolTag> {
        self.files.get(&key.file)?.get(key.index)
    }

    pub fn file_tags(&self, file: FileId) -> Option<&[SymbolTag]> {
        self.files.get(&file).map(Vec::as_slice)
    }

    /// Iterates files in ascending id order.
    pub fn files(&self) -> impl Iterator<Item = (FileId, &[SymbolTag])> {
        self.files.iter().map(|(id, tags)| (*id, tags.as_slice()))
    }

    /// Iterates every class tag with its key, file by file, in tag order.
    pub fn classes(&self) -> impl Iterator<Item = (TagKey, &SymbolTag)> {
        self.files.iter().flat_map(|(file, tags)| {
            tags.iter()
                .enumerate()
                .filter(|(_, tag)| tag.is_class())
                .map(move |(index, tag)| (TagKey::new(*file, index), tag))
        })
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn tag_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FromIterator<(FileId, Vec<SymbolTag>)> for TagStore {
    fn from_iter<I: IntoIterator<Item = (FileId, Vec<SymbolTag>)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

/// Lexical nesting: owner tag → directly contained tags.
///
/// Not total. An owner without an entry simply has no discovered children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainmentIndex {
    children: BTreeMap<TagKey, Vec<TagKey>>,
}

impl ContainmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, owner: TagKey, children: Vec<TagKey>) {
        self.children.insert(owner, children);
    }

    pub fn children_of(&self, owner: TagKey) -> &[TagKey] {
        self.children.get(&owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (TagKey, &[TagKey])> {
        self.children
            .iter()
            .map(|(owner, children)| (*owner, children.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl FromIterator<(TagKey, Vec<TagKey>)> for ContainmentIndex {
    fn from_iter<I: IntoIterator<Item = (TagKey, Vec<TagKey>)>>(iter: I) -> Self {
        Self {
            children: iter.into_iter().collect(),
        }
    }
}

/// Id of a lexical scope within a file.
pub type ScopeId = usize;

/// Connectable symbols visible in one scope, by name.
pub type ConnectableSymbols = BTreeMap<String, serde_json::Value>;

/// A class name declared in a file, with the indexer's local id for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomClass {
    pub name: String,
    pub id: usize,
}

impl From<(String, usize)> for CustomClass {
    fn from((name, id): (String, usize)) -> Self {
        Self { name, id }
    }
}

/// Visibility and custom-type tables.
///
/// Stored as delivered. Graph building does not read them; the connectable
/// entries stay opaque JSON until a feature consumes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeTables {
    pub custom_classes: BTreeMap<FileId, Vec<CustomClass>>,
    pub accessible_scopes: BTreeMap<FileId, BTreeMap<ScopeId, Vec<TagKey>>>,
    pub scoped_connectable: BTreeMap<FileId, BTreeMap<ScopeId, ConnectableSymbols>>,
}

impl ScopeTables {
    /// Custom classes visible by name in `file`.
    pub fn custom_classes_in(&self, file: FileId) -> &[CustomClass] {
        self.custom_classes
            .get(&file)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Tags accessible from `scope` in `file`.
    pub fn accessible_from(&self, file: FileId, scope: ScopeId) -> &[TagKey] {
        self.accessible_scopes
            .get(&file)
            .and_then(|scopes| scopes.get(&scope))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.custom_classes.is_empty()
            && self.accessible_scopes.is_empty()
            && self.scoped_connectable.is_empty()
    }
}
