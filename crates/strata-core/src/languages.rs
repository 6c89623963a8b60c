//! Built-in data types per language.
//!
//! The indexer resolves a type reference to `ClassRef::DataType(id)` when the
//! referenced name is a primitive of the file's language. `id` is the
//! position of that name in the table below, so the tables are append-only.

use std::path::Path;

/// Languages with a built-in type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cpp,
}

const C_DATA_TYPES: &[&str] = &[
    "void",
    "char",
    "signed char",
    "unsigned char",
    "short",
    "short int",
    "signed short",
    "signed short int",
    "unsigned short",
    "unsigned short int",
    "int",
    "signed",
    "signed int",
    "unsigned",
    "unsigned int",
    "long",
    "long int",
    "signed long",
    "signed long int",
    "unsigned long",
    "unsigned long int",
    "long long",
    "long long int",
    "signed long long",
    "signed long long int",
    "unsigned long long",
    "unsigned long long int",
    "float",
    "double",
    "long double",
];

// C++ shares the C primitive table.
const CPP_DATA_TYPES: &[&str] = C_DATA_TYPES;

impl Language {
    /// Detects the language from a file path's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        match ext {
            "c" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "h" | "hpp" => Some(Language::Cpp),
            _ => None,
        }
    }

    pub fn data_types(&self) -> &'static [&'static str] {
        match self {
            Language::C => C_DATA_TYPES,
            Language::Cpp => CPP_DATA_TYPES,
        }
    }
}

/// Built-in type table for the language of `path`, if known.
pub fn data_types(path: impl AsRef<Path>) -> Option<&'static [&'static str]> {
    Language::from_path(path).map(|lang| lang.data_types())
}

/// Name of built-in type `id` for the language of `path`.
pub fn data_type_name(path: impl AsRef<Path>, id: usize) -> Option<&'static str> {
    data_types(path)?.get(id).copied()
}
