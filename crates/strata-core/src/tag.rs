//! Symbol tags as emitted by the external indexer.
//!
//! A tag is one declaration (class, function or object) inside a file.
//! Tags are addressed by [`TagKey`], the pair of a file id and the tag's
//! position in that file's tag sequence.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a file in the indexer's file list.
pub type FileId = usize;

/// Locator for one tag: `(file id, index into that file's tags)`.
///
/// Serialized as a two-element array, `[file, index]`, which is how the
/// indexer writes it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct TagKey {
    pub file: FileId,
    pub index: usize,
}

impl TagKey {
    pub fn new(file: FileId, index: usize) -> Self {
        Self { file, index }
    }

    /// The stable graph id for the class declared at this key.
    pub fn node_id(&self) -> String {
        format!("{}-{}", self.file, self.index)
    }
}

impl From<(usize, usize)> for TagKey {
    fn from((file, index): (usize, usize)) -> Self {
        Self { file, index }
    }
}

impl From<TagKey> for (usize, usize) {
    fn from(key: TagKey) -> Self {
        (key.file, key.index)
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.file, self.index)
    }
}

/// A reference to a class, in one of three resolution states.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassRef {
    /// Not yet indexed; only the name is known.
    Undiscovered(String),
    /// Resolved to a concrete tag.
    Connected(TagKey),
    /// A built-in type of the file's language. The id is a position in
    /// [`crate::languages::data_types`].
    DataType(usize),
}

impl ClassRef {
    /// Returns the name still waiting to be resolved, if any.
    pub fn needed_class(&self) -> Option<&str> {
        match self {
            ClassRef::Undiscovered(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the resolved tag key, if any.
    pub fn connected(&self) -> Option<TagKey> {
        match self {
            ClassRef::Connected(key) => Some(*key),
            _ => None,
        }
    }
}

/// One symbol declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolTag {
    Class {
        name: String,
        #[serde(default)]
        parents: Vec<ClassRef>,
    },
    /// `class` is the function's return type when the indexer knows it.
    Function {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        class: Option<ClassRef>,
    },
    /// `class` is the object's declared type when the indexer knows it.
    Object {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        class: Option<ClassRef>,
    },
}

impl SymbolTag {
    pub fn class(name: impl Into<String>, parents: Vec<ClassRef>) -> Self {
        SymbolTag::Class {
            name: name.into(),
            parents,
        }
    }

    pub fn function(name: impl Into<String>) -> Self {
        SymbolTag::Function {
            name: name.into(),
            class: None,
        }
    }

    pub fn object(name: impl Into<String>) -> Self {
        SymbolTag::Object {
            name: name.into(),
            class: None,
        }
    }

    /// Attaches a type reference to a function or object tag.
    ///
    /// Class tags are returned unchanged.
    pub fn with_type(mut self, type_ref: ClassRef) -> Self {
        match &mut self {
            SymbolTag::Function { class, .. } | SymbolTag::Object { class, .. } => {
                *class = Some(type_ref);
            }
            SymbolTag::Class { .. } => {}
        }
        self
    }

    pub fn name(&self) -> &str {
        match self {
            SymbolTag::Class { name, .. }
            | SymbolTag::Function { name, .. }
            | SymbolTag::Object { name, .. } => name,
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self, SymbolTag::Class { .. })
    }

    /// Parent references of a class tag; empty for everything else.
    pub fn parents(&self) -> &[ClassRef] {
        match self {
            SymbolTag::Class { parents, .. } => parents,
            _ => &[],
        }
    }

    /// Names referenced by this tag that are not resolved yet.
    pub fn needed_classes(&self) -> Vec<&str> {
        match self {
            SymbolTag::Class { parents, .. } => {
                parents.iter().filter_map(ClassRef::needed_class).collect()
            }
            SymbolTag::Function { class, .. } | SymbolTag::Object { class, .. } => class
                .as_ref()
                .and_then(ClassRef::needed_class)
                .into_iter()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_key_wire_format() {
        let key: TagKey = serde_json::from_str("[3, 7]").unwrap();
        assert_eq!(key, TagKey::new(3, 7));
        assert_eq!(serde_json::to_string(&key).unwrap(), "[3,7]");
        assert_eq!(key.node_id(), "3-7");
    }

    #[test]
    fn test_symbol_tag_externally_tagged() {
        let json = r#"{"Class":{"name":"Dog","parents":[
            {"Connected":[0,0]},{"Undiscovered":"Pet"},{"DataType":2}
        ]}}"#;
        let tag: SymbolTag = serde_json::from_str(json).unwrap();

        assert!(tag.is_class());
        assert_eq!(tag.name(), "Dog");
        assert_eq!(tag.parents().len(), 3);
        assert_eq!(tag.parents()[0].connected(), Some(TagKey::new(0, 0)));
        assert_eq!(tag.needed_classes(), vec!["Pet"]);
    }

    #[test]
    fn test_function_without_type_ref() {
        let tag: SymbolTag = serde_json::from_str(r#"{"Function":{"name":"bark"}}"#).unwrap();
        assert_eq!(tag, SymbolTag::function("bark"));
        assert!(tag.parents().is_empty());

        let typed = SymbolTag::object("tail").with_type(ClassRef::DataType(0));
        let json = serde_json::to_string(&typed).unwrap();
        assert!(json.contains("DataType"));
    }
}
