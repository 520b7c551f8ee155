//! A single YAML file of requirements.
//!
//! A [`Folio`] snapshots its file when opened. Parsing turns the snapshot into
//! draft [`Requirement`]s; writing renders the requirements bound to it and
//! only touches the file when the text has changed.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde_yaml::Value;

use crate::{
    domain::{Diagnostics, Graph, Index, Requirement, RequirementId},
    storage::record::RequirementRecord,
};

/// A YAML file holding one or more requirements.
#[derive(Debug)]
pub struct Folio {
    path: PathBuf,
    snapshot: Option<String>,
    valid: bool,
    bound: Vec<RequirementId>,
}

impl Folio {
    /// Open a folio, reading its content immediately.
    ///
    /// A file that cannot be read still yields a folio. It is marked
    /// invalid and the failure is noted against the file.
    pub fn open(path: impl Into<PathBuf>, diagnostics: &mut Diagnostics) -> Self {
        let path = path.into();
        let content = fs::read_to_string(&path);
        Self::from_read(path, content, diagnostics)
    }

    /// Build a folio from the result of reading `path`.
    ///
    /// This lets the reads happen elsewhere (in parallel) while notes are
    /// still applied in a fixed order.
    pub fn from_read(
        path: impl Into<PathBuf>,
        content: io::Result<String>,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let path = path.into();
        match content {
            Ok(content) => Self {
                path,
                snapshot: Some(content),
                valid: true,
                bound: Vec::new(),
            },
            Err(error) => {
                tracing::debug!("Failed to read {}: {error}", path.display());
                diagnostics.file_note(&path, "Error reading file.", true);
                Self {
                    path,
                    snapshot: None,
                    valid: false,
                    bound: Vec::new(),
                }
            }
        }
    }

    /// A folio for a file that does not exist yet. It is valid and empty;
    /// the first write creates it.
    #[must_use]
    pub fn create(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshot: None,
            valid: true,
            bound: Vec::new(),
        }
    }

    /// The file this folio reads from and writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the folio is usable. Invalid folios are never written.
    #[must_use]
    pub const fn valid(&self) -> bool {
        self.valid
    }

    /// The file content as last read or written.
    #[must_use]
    pub fn snapshot(&self) -> Option<&str> {
        self.snapshot.as_deref()
    }

    /// Derive draft requirements from the snapshot.
    ///
    /// An invalid folio returns nothing unless `force` is set, so the same
    /// failure is not reported twice. Each failure adds exactly one problem
    /// note against the file. A record with a bad key, or one that cannot be
    /// decoded, is skipped; the folio only becomes invalid if nothing usable
    /// is left.
    pub fn parse(&mut self, force: bool, diagnostics: &mut Diagnostics) -> Vec<Requirement> {
        if !self.valid && !force {
            return Vec::new();
        }

        let Some(snapshot) = self.snapshot.as_deref() else {
            // unreadable; already reported when opened
            self.valid = false;
            return Vec::new();
        };
        self.valid = true;

        let value = match serde_yaml::from_str::<Value>(snapshot) {
            Ok(value) => value,
            Err(error) => {
                tracing::debug!("Failed to parse {}: {error}", self.path.display());
                return self.invalidate("Error parsing .yaml file.", diagnostics);
            }
        };

        let mapping = match value {
            Value::Mapping(mapping) => mapping,
            Value::Null => return self.invalidate("No data read from file.", diagnostics),
            _ => return self.invalidate("Error parsing .yaml file.", diagnostics),
        };

        if mapping.is_empty() {
            return self.invalidate("No requirements found in file.", diagnostics);
        }

        let mut requirements = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let key = key_text(&key);
            let Ok(index) = key.parse::<Index>() else {
                diagnostics.file_note(&self.path, format!("Invalid index: {key}."), true);
                continue;
            };

            match RequirementRecord::from_value(value) {
                Ok(record) => {
                    requirements.push(record.into_requirement(index, self.path.clone()));
                }
                Err(error) => {
                    tracing::debug!("{key}: {error}");
                    diagnostics.file_note(
                        &self.path,
                        format!("Error creating requirement with key <{key}> from file."),
                        true,
                    );
                }
            }
        }

        if requirements.is_empty() {
            return self.invalidate("No requirements were able to be created from file.", diagnostics);
        }

        requirements
    }

    fn invalidate(&mut self, message: &str, diagnostics: &mut Diagnostics) -> Vec<Requirement> {
        diagnostics.file_note(&self.path, message, true);
        self.valid = false;
        Vec::new()
    }

    /// Associate a requirement with this folio for the next write. Binding
    /// the same requirement twice has no effect.
    pub fn bind(&mut self, id: RequirementId) {
        if !self.bound.contains(&id) {
            self.bound.push(id);
        }
    }

    /// The requirements bound for the next write, in bind order.
    #[must_use]
    pub fn bound(&self) -> &[RequirementId] {
        &self.bound
    }

    /// Render the bound requirements as folio text.
    ///
    /// Records are separated by a blank line and the whole text is trimmed,
    /// so there is no trailing newline. A requirement that cannot be rendered
    /// is noted and left out.
    pub fn render(&self, graph: &Graph, diagnostics: &mut Diagnostics) -> String {
        let mut records = Vec::with_capacity(self.bound.len());
        for &id in &self.bound {
            let requirement = graph.requirement(id);
            match RequirementRecord::from(requirement).to_yaml(requirement.index()) {
                Ok(text) => records.push(text),
                Err(error) => {
                    tracing::debug!("{}: {error}", requirement.index());
                    diagnostics.index_note(
                        requirement,
                        "Error creating .yaml text from requirement.",
                        true,
                    );
                }
            }
        }

        records.join("\n\n").trim().to_string()
    }

    /// Write the bound requirements back to the file.
    ///
    /// Nothing happens for an invalid folio, a folio with nothing bound, or
    /// when the rendered text matches the snapshot. Returns whether the file
    /// was written. The bindings are cleared either way.
    pub fn write(&mut self, graph: &Graph, diagnostics: &mut Diagnostics) -> bool {
        if !self.valid || self.bound.is_empty() {
            self.bound.clear();
            return false;
        }

        let text = self.render(graph, diagnostics);
        self.bound.clear();

        if self.snapshot.as_deref() == Some(text.as_str()) {
            tracing::debug!("{} unchanged", self.path.display());
            return false;
        }

        if let Err(error) = fs::write(&self.path, &text) {
            tracing::debug!("Failed to write {}: {error}", self.path.display());
            diagnostics.file_note(&self.path, "Error writing file.", true);
            return false;
        }

        tracing::info!("Wrote {}", self.path.display());
        self.snapshot = Some(text);
        true
    }
}

fn key_text(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|text| text.trim().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn folio_with(dir: &Path, name: &str, content: &str) -> (Folio, Diagnostics) {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        let mut diagnostics = Diagnostics::with_root(dir);
        let folio = Folio::open(&path, &mut diagnostics);
        (folio, diagnostics)
    }

    fn only_file_note(diagnostics: &Diagnostics, folio: &Folio) -> String {
        let notes = diagnostics.file_notes(folio.path()).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(diagnostics.problem_count(), 1);
        notes[0].clone()
    }

    #[test]
    fn parses_records_in_file_order() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut folio, mut diagnostics) = folio_with(
            tmp.path(),
            "software.yaml",
            "r00000002:\n  title: Second\n\nnew1:\n  type: Software\n  label: [Critical]\n",
        );

        let requirements = folio.parse(false, &mut diagnostics);

        assert!(folio.valid());
        assert_eq!(diagnostics.problem_count(), 0);
        assert_eq!(requirements.len(), 2);
        assert_eq!(requirements[0].title(), "Second");
        assert_eq!(requirements[1].index().to_string(), "new1");
        assert_eq!(requirements[1].kind(), "software");
        assert!(requirements[1].labels().contains("critical"));
        assert_eq!(requirements[1].source(), folio.path());
    }

    #[test]
    fn invalid_key_skips_only_that_record() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut folio, mut diagnostics) = folio_with(
            tmp.path(),
            "software.yaml",
            "R00000001:\n  title: Bad\nr00000002:\n  title: Good\n",
        );

        let requirements = folio.parse(false, &mut diagnostics);

        assert!(folio.valid());
        assert_eq!(requirements.len(), 1);
        assert_eq!(only_file_note(&diagnostics, &folio), "Invalid index: R00000001.");
    }

    #[test]
    fn undecodable_record_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut folio, mut diagnostics) = folio_with(
            tmp.path(),
            "software.yaml",
            "r00000001:\n  label: {a: b}\nr00000002:\n  title: Good\n",
        );

        let requirements = folio.parse(false, &mut diagnostics);

        assert_eq!(requirements.len(), 1);
        assert_eq!(
            only_file_note(&diagnostics, &folio),
            "Error creating requirement with key <r00000001> from file."
        );
    }

    #[test]
    fn failure_modes_invalidate_with_one_note() {
        let cases = [
            ("", "No data read from file."),
            ("{}", "No requirements found in file."),
            ("- r00000001\n", "Error parsing .yaml file."),
            ("r00000001: [unclosed\n", "Error parsing .yaml file."),
            ("bogus:\n  title: x\n", "No requirements were able to be created from file."),
        ];

        for (content, message) in cases {
            let tmp = tempfile::tempdir().unwrap();
            let (mut folio, mut diagnostics) = folio_with(tmp.path(), "bad.yaml", content);
            let requirements = folio.parse(false, &mut diagnostics);

            assert!(requirements.is_empty(), "{content:?}");
            assert!(!folio.valid(), "{content:?}");
            let notes = diagnostics.file_notes(folio.path()).unwrap();
            assert_eq!(notes.last().map(String::as_str), Some(message), "{content:?}");
        }
    }

    #[test]
    fn invalid_folio_is_not_reparsed_unless_forced() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut folio, mut diagnostics) = folio_with(tmp.path(), "bad.yaml", "{}");
        folio.parse(false, &mut diagnostics);
        assert_eq!(diagnostics.problem_count(), 1);

        assert!(folio.parse(false, &mut diagnostics).is_empty());
        assert_eq!(diagnostics.problem_count(), 1);

        folio.parse(true, &mut diagnostics);
        assert_eq!(diagnostics.problem_count(), 2);
    }

    #[test]
    fn unreadable_file_is_invalid_but_constructible() {
        let tmp = tempfile::tempdir().unwrap();
        let mut diagnostics = Diagnostics::with_root(tmp.path());
        let mut folio = Folio::open(tmp.path().join("missing.yaml"), &mut diagnostics);

        assert!(!folio.valid());
        assert_eq!(only_file_note(&diagnostics, &folio), "Error reading file.");
        assert!(folio.parse(true, &mut diagnostics).is_empty());
        assert_eq!(diagnostics.problem_count(), 1);
    }

    #[test]
    fn write_is_suppressed_when_text_is_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        let content = "r00000001:\n  type: customer\n  title: Widgets\n  child_idx: []\n\nr00000002:\n  title: Spin";
        let (mut folio, mut diagnostics) = folio_with(tmp.path(), "acme.yaml", content);

        let mut graph = Graph::new();
        for requirement in folio.parse(false, &mut diagnostics) {
            graph.insert(requirement, &mut diagnostics);
        }
        for id in graph.ids().collect::<Vec<_>>() {
            folio.bind(id);
            folio.bind(id);
        }
        assert_eq!(folio.bound().len(), 2);
        assert_eq!(folio.render(&graph, &mut diagnostics), content);
        assert!(!folio.write(&graph, &mut diagnostics));
        assert!(folio.bound().is_empty());
    }

    #[test]
    fn write_renders_edits_and_refreshes_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut folio, mut diagnostics) =
            folio_with(tmp.path(), "software.yaml", "new1:\n  title: Spin\n");

        let mut graph = Graph::new();
        for requirement in folio.parse(false, &mut diagnostics) {
            graph.insert(requirement, &mut diagnostics);
        }
        graph.renumber(&mut diagnostics);
        let id = graph.ids().next().unwrap();
        graph.get_mut(&"r00000001".parse().unwrap()).unwrap().add_label("Safety");

        folio.bind(id);
        assert!(folio.write(&graph, &mut diagnostics));
        let expected = "r00000001:\n  title: Spin\n  label:\n  - safety";
        assert_eq!(fs::read_to_string(folio.path()).unwrap(), expected);
        assert_eq!(folio.snapshot(), Some(expected));

        folio.bind(id);
        assert!(!folio.write(&graph, &mut diagnostics));
    }

    #[test]
    fn invalid_folio_is_never_written() {
        let tmp = tempfile::tempdir().unwrap();
        let (mut folio, mut diagnostics) = folio_with(tmp.path(), "bad.yaml", "{}");
        folio.parse(false, &mut diagnostics);

        let mut graph = Graph::new();
        graph.insert(
            Requirement::new("r00000001".parse().unwrap(), folio.path()),
            &mut diagnostics,
        );
        folio.bind(graph.ids().next().unwrap());
        assert!(!folio.write(&graph, &mut diagnostics));
        assert_eq!(fs::read_to_string(folio.path()).unwrap(), "{}");
    }
}
