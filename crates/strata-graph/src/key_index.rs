use crate::graph::NodeId;
use std::collections::{BTreeSet, HashMap};
use strata_core::{FileId, TagKey};

/// Resolves tag keys to graph nodes.
///
/// Node ids, member attachment and parent resolution all go through this
/// table, so every lookup uses the tag's original index in its file.
#[derive(Debug, Default, Clone)]
pub struct KeyIndex {
    by_key: HashMap<TagKey, NodeId>,

    /// Files that declare at least one class.
    files: BTreeSet<FileId>,
}

impl KeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the node for a class tag.
    pub fn insert(&mut self, key: TagKey, id: NodeId) {
        self.by_key.insert(key, id);
        self.files.insert(key.file);
    }

    pub fn resolve(&self, key: TagKey) -> Option<NodeId> {
        self.by_key.get(&key).copied()
    }

    /// Number of files that declare at least one class.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_resolve() {
        let mut index = KeyIndex::new();
        let key = TagKey::new(2, 5);
        let id = NodeId::new(1);

        index.insert(key, id);

        assert_eq!(index.resolve(key), Some(id));
        assert_eq!(index.resolve(TagKey::new(2, 4)), None);
        assert_eq!(index.file_count(), 1);

        index.insert(TagKey::new(2, 7), NodeId::new(2));
        index.insert(TagKey::new(0, 0), NodeId::new(0));
        assert_eq!(index.file_count(), 2);
    }
}
