//! Process state built from indexer events.
//!
//! `ProjectState` is the single owner of the tag store, the containment
//! index and the scope tables. Each merge replaces a whole table with the
//! one from the snapshot (last snapshot wins). Bad keys are dropped with a
//! diagnostic and never abort the merge.

use crate::error::Diagnostic;
use crate::snapshot::{
    parse_file_id, parse_tag_key, IndexerEvent, IntenseData, Progress, ProjectStructure,
};
use crate::store::{ContainmentIndex, CustomClass, ScopeId, ScopeTables, TagStore};
use crate::tag::FileId;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// What an applied event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Files, tags, imports and containment were replaced.
    Structure,
    /// Scope tables were replaced.
    Scopes,
    /// Only the advisory progress changed.
    Progress,
}

impl Change {
    /// Whether derived graph and layout state is now stale.
    pub fn needs_rebuild(&self) -> bool {
        !matches!(self, Change::Progress)
    }
}

/// Tables owned by the ingestion layer.
#[derive(Debug, Clone, Default)]
pub struct ProjectState {
    files: Vec<String>,
    imports: BTreeMap<FileId, Vec<FileId>>,
    tags: TagStore,
    containment: ContainmentIndex,
    scopes: ScopeTables,
    progress: Option<Progress>,
    structure_diagnostics: Vec<Diagnostic>,
    scope_diagnostics: Vec<Diagnostic>,
}

impl ProjectState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one indexer event.
    pub fn apply(&mut self, event: IndexerEvent) -> Change {
        match event {
            IndexerEvent::ProjectStructure(structure) => {
                self.merge_structure(structure);
                Change::Structure
            }
            IndexerEvent::IntenseData(data) => {
                self.merge_intense_data(data);
                Change::Scopes
            }
            IndexerEvent::Progress(progress) => {
                self.record_progress(progress);
                Change::Progress
            }
        }
    }

    /// Replaces files, imports, tags and containment from a snapshot.
    ///
    /// Returns the diagnostics recorded for this snapshot.
    pub fn merge_structure(&mut self, structure: ProjectStructure) -> &[Diagnostic] {
        let mut diagnostics = Vec::new();

        let imports = parse_file_keyed(structure.imports, "imports", &mut diagnostics);
        let tags: TagStore = parse_file_keyed(structure.tags, "tags", &mut diagnostics)
            .into_iter()
            .collect();

        let mut containment = ContainmentIndex::new();
        for (raw, children) in structure.containment {
            match parse_tag_key(&raw) {
                Some(owner) => containment.insert(owner, children),
                None => diagnostics.push(Diagnostic::malformed_key("containment", raw)),
            }
        }

        for diagnostic in &diagnostics {
            warn!("{}", diagnostic);
        }
        debug!(
            "Merged structure: {} files, {} tags, {} containment entries",
            structure.files.len(),
            tags.tag_count(),
            containment.len()
        );

        self.files = structure.files;
        self.imports = imports;
        self.tags = tags;
        self.containment = containment;
        self.structure_diagnostics = diagnostics;
        &self.structure_diagnostics
    }

    /// Replaces the scope tables from an `intense_data` snapshot.
    pub fn merge_intense_data(&mut self, data: IntenseData) -> &[Diagnostic] {
        let mut diagnostics = Vec::new();

        let custom_classes =
            parse_file_keyed(data.custom_classes, "custom_classes", &mut diagnostics)
                .into_iter()
                .map(|(file, classes)| (file, classes.into_iter().map(CustomClass::from).collect()))
                .collect();

        let accessible_scopes =
            parse_file_keyed(data.accessible_scopes, "accessible_scopes", &mut diagnostics)
                .into_iter()
                .map(|(file, scopes)| {
                    let scopes = parse_scope_keyed(scopes, "accessible_scopes", &mut diagnostics);
                    (file, scopes)
                })
                .collect();

        let scoped_connectable =
            parse_file_keyed(data.scoped_connectable, "scoped_connectable", &mut diagnostics)
                .into_iter()
                .map(|(file, scopes)| {
                    let scopes = parse_scope_keyed(scopes, "scoped_connectable", &mut diagnostics);
                    (file, scopes)
                })
                .collect();

        for diagnostic in &diagnostics {
            warn!("{}", diagnostic);
        }

        self.scopes = ScopeTables {
            custom_classes,
            accessible_scopes,
            scoped_connectable,
        };
        self.scope_diagnostics = diagnostics;
        &self.scope_diagnostics
    }

    pub fn record_progress(&mut self, progress: Progress) {
        debug!("Indexer progress: {} {:.0}%", progress.phase, progress.percent);
        self.progress = Some(progress);
    }

    pub fn tags(&self) -> &TagStore {
        &self.tags
    }

    pub fn containment(&self) -> &ContainmentIndex {
        &self.containment
    }

    pub fn scopes(&self) -> &ScopeTables {
        &self.scopes
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Path of the file with the given id.
    pub fn file_path(&self, file: FileId) -> Option<&str> {
        self.files.get(file).map(String::as_str)
    }

    /// Files imported by `file`.
    pub fn imports_of(&self, file: FileId) -> &[FileId] {
        self.imports.get(&file).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn progress(&self) -> Option<&Progress> {
        self.progress.as_ref()
    }

    /// Diagnostics from the latest structure and scope merges.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.structure_diagnostics
            .iter()
            .chain(self.scope_diagnostics.iter())
    }
}

fn parse_file_keyed<V>(
    raw: BTreeMap<String, V>,
    table: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> BTreeMap<FileId, V> {
    let mut parsed = BTreeMap::new();
    for (key, value) in raw {
        match parse_file_id(&key) {
            Some(file) => {
                parsed.insert(file, value);
            }
            None => diagnostics.push(Diagnostic::malformed_key(table, key)),
        }
    }
    parsed
}

fn parse_scope_keyed<V>(
    raw: BTreeMap<String, V>,
    table: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> BTreeMap<ScopeId, V> {
    // scope ids use the same integer key format as file ids
    parse_file_keyed(raw, table, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{SymbolTag, TagKey};

    fn structure(
        tags: &[(&str, Vec<SymbolTag>)],
        containment: &[(&str, Vec<TagKey>)],
    ) -> ProjectStructure {
        ProjectStructure {
            files: vec!["a.cpp".into(), "b.cpp".into()],
            imports: BTreeMap::new(),
            tags: tags.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            containment: containment
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn test_malformed_keys_are_dropped() {
        let mut state = ProjectState::new();
        let diagnostics = state.merge_structure(structure(
            &[
                ("0", vec![SymbolTag::class("A", vec![])]),
                ("zero", vec![SymbolTag::class("B", vec![])]),
            ],
            &[("[0,0]", vec![TagKey::new(0, 1)]), ("0:0", vec![])],
        ));

        assert_eq!(diagnostics.len(), 2);
        assert!(matches!(
            &diagnostics[0],
            Diagnostic::MalformedKey { table, key } if table == "tags" && key == "zero"
        ));
        assert_eq!(state.tags().file_count(), 1);
        assert_eq!(state.containment().len(), 1);
        assert_eq!(state.containment().children_of(TagKey::new(0, 0)), &[TagKey::new(0, 1)]);
    }

    #[test]
    fn test_last_snapshot_wins() {
        let mut state = ProjectState::new();
        state.merge_structure(structure(
            &[
                ("0", vec![SymbolTag::class("A", vec![])]),
                ("1", vec![SymbolTag::class("B", vec![])]),
            ],
            &[("[0,0]", vec![TagKey::new(1, 0)])],
        ));
        state.merge_structure(structure(&[("1", vec![SymbolTag::class("C", vec![])])], &[]));

        assert!(state.tags().file_tags(0).is_none());
        assert_eq!(state.tags().get(TagKey::new(1, 0)).map(SymbolTag::name), Some("C"));
        assert!(state.containment().is_empty());
        assert_eq!(state.diagnostics().count(), 0);
    }

    #[test]
    fn test_imports_by_file() {
        let mut state = ProjectState::new();
        let mut snapshot = structure(&[], &[]);
        snapshot.imports.insert("1".into(), vec![0]);
        snapshot.imports.insert("x".into(), vec![1]);

        let diagnostics = state.merge_structure(snapshot);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(state.imports_of(1), &[0]);
        assert!(state.imports_of(0).is_empty());
    }

    #[test]
    fn test_apply_reports_change() {
        let mut state = ProjectState::new();

        let change = state.apply(IndexerEvent::Progress(Progress {
            phase: "walk".into(),
            percent: 50.0,
        }));
        assert_eq!(change, Change::Progress);
        assert!(!change.needs_rebuild());
        assert_eq!(state.progress().map(|p| p.percent), Some(50.0));

        let change = state.apply(IndexerEvent::ProjectStructure(structure(&[], &[])));
        assert!(change.needs_rebuild());
        assert_eq!(state.file_path(1), Some("b.cpp"));
        assert_eq!(state.file_path(2), None);
    }

    #[test]
    fn test_intense_data_stored_verbatim() {
        let mut state = ProjectState::new();
        let mut data = IntenseData::default();
        data.custom_classes.insert("0".into(), vec![("Dog".into(), 3)]);
        data.accessible_scopes.insert(
            "0".into(),
            [
                ("1".to_string(), vec![TagKey::new(0, 3)]),
                ("?".to_string(), vec![]),
            ]
            .into_iter()
            .collect(),
        );

        let diagnostics = state.merge_intense_data(data);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(state.scopes().custom_classes_in(0)[0].id, 3);
        assert_eq!(state.scopes().accessible_from(0, 1), &[TagKey::new(0, 3)]);
    }
}
