//! Collection of validation notes gathered while a standard is read,
//! linked, and written.
//!
//! Notes come in three scopes: global, per file, and per requirement index.
//! Any note can be flagged as a problem, which bumps a single counter. The
//! [`Diagnostics::report`] text is deterministic for a given sequence of
//! notes.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use crate::domain::{Index, Requirement};

/// The file name used by [`Diagnostics::save`].
pub const REPORT_FILE_NAME: &str = "validation_report.txt";

/// Accumulates notes and problem counts.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    /// Paths in the report are shown relative to this directory.
    root: Option<PathBuf>,
    problem_count: usize,
    notes: Vec<String>,
    files: Vec<FileNotes>,
    file_lookup: HashMap<PathBuf, usize>,
    /// Index buckets stay with the file they were first created under.
    index_lookup: HashMap<Index, (usize, usize)>,
}

#[derive(Debug, Clone)]
struct FileNotes {
    path: PathBuf,
    notes: Vec<String>,
    indices: Vec<IndexNotes>,
}

#[derive(Debug, Clone)]
struct IndexNotes {
    index: Index,
    notes: Vec<String>,
}

impl Diagnostics {
    /// Creates an empty collector that shows paths as given.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collector that shows paths relative to `root`.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Sets the directory report paths are shown relative to.
    pub fn set_root(&mut self, root: impl Into<PathBuf>) {
        self.root = Some(root.into());
    }

    /// The directory report paths are shown relative to, if any.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Add a global note.
    pub fn note(&mut self, message: impl Into<String>, problem: bool) {
        let message = message.into();
        log(None, &message, problem);
        self.notes.push(message);
        self.count(problem);
    }

    /// Add a note about a file.
    pub fn file_note(&mut self, path: &Path, message: impl Into<String>, problem: bool) {
        let message = message.into();
        log(Some(&path.display().to_string()), &message, problem);
        let position = self.file_position(path);
        self.files[position].notes.push(message);
        self.count(problem);
    }

    /// Add a note about a requirement.
    ///
    /// The note is filed under the requirement's source file. An index seen
    /// for the first time gets a bucket in that file; later notes for the
    /// same index land in the same bucket whichever file they come from.
    pub fn index_note(&mut self, requirement: &Requirement, message: impl Into<String>, problem: bool) {
        let message = message.into();
        log(Some(&requirement.index().to_string()), &message, problem);

        let file = self.file_position(requirement.source());
        let (file, bucket) = match self.index_lookup.get(requirement.index()) {
            Some(&position) => position,
            None => {
                let indices = &mut self.files[file].indices;
                indices.push(IndexNotes {
                    index: requirement.index().clone(),
                    notes: Vec::new(),
                });
                let position = (file, indices.len() - 1);
                self.index_lookup
                    .insert(requirement.index().clone(), position);
                position
            }
        };

        self.files[file].indices[bucket].notes.push(message);
        self.count(problem);
    }

    /// File the notes kept for `from` under `to` instead.
    ///
    /// Used when a placeholder is renumbered, so the report shows one block
    /// under the final index. Nothing changes if `to` already has notes.
    pub fn rename_index(&mut self, from: &Index, to: &Index) {
        if self.index_lookup.contains_key(to) {
            return;
        }
        if let Some((file, bucket)) = self.index_lookup.remove(from) {
            self.files[file].indices[bucket].index = to.clone();
            self.index_lookup.insert(to.clone(), (file, bucket));
        }
    }

    /// The number of notes flagged as problems, across all scopes.
    #[must_use]
    pub const fn problem_count(&self) -> usize {
        self.problem_count
    }

    /// The global notes, in insertion order.
    #[must_use]
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// The notes recorded against a file, if any.
    #[must_use]
    pub fn file_notes(&self, path: &Path) -> Option<&[String]> {
        self.file_lookup
            .get(path)
            .map(|&position| self.files[position].notes.as_slice())
    }

    /// The notes recorded against an index, if any.
    #[must_use]
    pub fn index_notes(&self, index: &Index) -> Option<&[String]> {
        self.index_lookup
            .get(index)
            .map(|&(file, bucket)| self.files[file].indices[bucket].notes.as_slice())
    }

    /// Render the report.
    ///
    /// Layout: a header with the problem count, global notes, then one
    /// block per file (first-seen order) holding its notes followed by its
    /// index blocks (first-seen order).
    #[must_use]
    pub fn report(&self) -> String {
        let mut report = format!("Validation Report\nProblems: {}\n\n", self.problem_count);

        for note in &self.notes {
            report.push_str(note);
            report.push('\n');
        }
        if !self.notes.is_empty() {
            report.push('\n');
        }

        for file in &self.files {
            report.push_str(&format!("File: {}\n", self.display_path(&file.path)));
            for note in &file.notes {
                report.push_str(&format!("\t\t{note}\n"));
            }
            report.push('\n');

            for index in &file.indices {
                report.push_str(&format!("\tIndex: {}\n", index.index));
                for note in &index.notes {
                    report.push_str(&format!("\t\t{note}\n"));
                }
                report.push('\n');
            }
        }

        report.trim().to_string()
    }

    /// Write the report to [`REPORT_FILE_NAME`] in `directory`, creating the
    /// directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file cannot
    /// be written.
    pub fn save(&self, directory: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(directory)?;
        let path = directory.join(REPORT_FILE_NAME);
        fs::write(&path, self.report())?;
        tracing::info!("Wrote validation report to {}", path.display());
        Ok(path)
    }

    fn file_position(&mut self, path: &Path) -> usize {
        if let Some(&position) = self.file_lookup.get(path) {
            return position;
        }
        self.files.push(FileNotes {
            path: path.to_path_buf(),
            notes: Vec::new(),
            indices: Vec::new(),
        });
        let position = self.files.len() - 1;
        self.file_lookup.insert(path.to_path_buf(), position);
        position
    }

    const fn count(&mut self, problem: bool) {
        if problem {
            self.problem_count += 1;
        }
    }

    fn display_path(&self, path: &Path) -> String {
        let relative = self
            .root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        relative.to_string_lossy().replace('\\', "/")
    }
}

fn log(scope: Option<&str>, message: &str, problem: bool) {
    match (scope, problem) {
        (Some(scope), true) => tracing::warn!("{scope}: {message}"),
        (Some(scope), false) => tracing::debug!("{scope}: {message}"),
        (None, true) => tracing::warn!("{message}"),
        (None, false) => tracing::debug!("{message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement(index: &str, source: &str) -> Requirement {
        Requirement::new(index.parse().unwrap(), source)
    }

    #[test]
    fn global_notes() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.note("This is a note.", false);
        assert_eq!(diagnostics.problem_count(), 0);
        diagnostics.note("This is a problem.", true);
        assert_eq!(diagnostics.problem_count(), 1);
        assert_eq!(
            diagnostics.report(),
            "Validation Report\nProblems: 1\n\nThis is a note.\nThis is a problem."
        );
    }

    #[test]
    fn file_notes_are_relative_to_root() {
        let mut diagnostics = Diagnostics::with_root("/work");
        let path = Path::new("/work/test/support/file/customer.yaml");
        diagnostics.file_note(path, "This is a note.", false);
        diagnostics.file_note(path, "This is a problem.", true);
        assert_eq!(
            diagnostics.report(),
            "Validation Report\nProblems: 1\n\n\
             File: test/support/file/customer.yaml\n\
             \t\tThis is a note.\n\
             \t\tThis is a problem."
        );
    }

    #[test]
    fn index_notes_nest_under_their_file() {
        let mut diagnostics = Diagnostics::with_root("/work");
        let req = requirement("r00000045", "/work/test/support/file/software.yaml");
        diagnostics.index_note(&req, "This is a note.", false);
        diagnostics.index_note(&req, "This is a problem.", true);
        assert_eq!(
            diagnostics.report(),
            "Validation Report\nProblems: 1\n\n\
             File: test/support/file/software.yaml\n\n\
             \tIndex: r00000045\n\
             \t\tThis is a note.\n\
             \t\tThis is a problem."
        );
    }

    #[test]
    fn report_keeps_first_seen_order() {
        let mut diagnostics = Diagnostics::with_root("/p");
        let b = requirement("r00000002", "/p/b.yaml");
        let a = requirement("r00000001", "/p/a.yaml");
        diagnostics.index_note(&b, "b first", true);
        diagnostics.file_note(Path::new("/p/a.yaml"), "a file", true);
        diagnostics.index_note(&a, "a index", false);
        diagnostics.note("global", false);
        diagnostics.file_note(Path::new("/p/b.yaml"), "b file", false);

        assert_eq!(
            diagnostics.report(),
            "Validation Report\nProblems: 2\n\n\
             global\n\n\
             File: b.yaml\n\
             \t\tb file\n\n\
             \tIndex: r00000002\n\
             \t\tb first\n\n\
             File: a.yaml\n\
             \t\ta file\n\n\
             \tIndex: r00000001\n\
             \t\ta index"
        );
    }

    #[test]
    fn index_bucket_stays_with_first_file() {
        let mut diagnostics = Diagnostics::with_root("/p");
        let first = requirement("r00000001", "/p/a.yaml");
        let second = requirement("r00000001", "/p/b.yaml");
        diagnostics.index_note(&first, "one", true);
        diagnostics.index_note(&second, "two", true);

        assert_eq!(
            diagnostics.index_notes(first.index()),
            Some(["one".to_string(), "two".to_string()].as_slice())
        );
        // the second file still gets a (note-free) bucket of its own
        assert_eq!(
            diagnostics.file_notes(Path::new("/p/b.yaml")),
            Some([].as_slice())
        );
        assert_eq!(diagnostics.problem_count(), 2);
    }

    #[test]
    fn renamed_index_keeps_one_block() {
        let mut diagnostics = Diagnostics::with_root("/p");
        let placeholder = requirement("new1", "/p/a.yaml");
        let renumbered = requirement("r00000001", "/p/a.yaml");
        diagnostics.index_note(&placeholder, "before", true);
        diagnostics.rename_index(placeholder.index(), renumbered.index());
        diagnostics.index_note(&renumbered, "after", true);

        assert_eq!(diagnostics.index_notes(placeholder.index()), None);
        assert_eq!(
            diagnostics.report(),
            "Validation Report\nProblems: 2\n\n\
             File: a.yaml\n\n\
             \tIndex: r00000001\n\
             \t\tbefore\n\
             \t\tafter"
        );
    }

    #[test]
    fn rename_onto_existing_notes_is_ignored() {
        let mut diagnostics = Diagnostics::new();
        let a = requirement("new1", "a.yaml");
        let b = requirement("r00000001", "a.yaml");
        diagnostics.index_note(&a, "a", true);
        diagnostics.index_note(&b, "b", true);
        diagnostics.rename_index(a.index(), b.index());

        assert_eq!(diagnostics.index_notes(a.index()), Some(["a".to_string()].as_slice()));
        assert_eq!(diagnostics.index_notes(b.index()), Some(["b".to_string()].as_slice()));
    }

    #[test]
    fn identical_sequences_give_identical_reports() {
        let build = || {
            let mut diagnostics = Diagnostics::with_root("/p");
            diagnostics.note("start", true);
            diagnostics.file_note(Path::new("/p/x.yaml"), "bad", true);
            diagnostics.index_note(&requirement("r00000003", "/p/x.yaml"), "worse", true);
            diagnostics.report()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn save_writes_the_report() {
        let tmp = tempfile::tempdir().unwrap();
        let mut diagnostics = Diagnostics::new();
        diagnostics.note("hello", true);
        let path = diagnostics
            .save(&tmp.path().join("reports").join("verification"))
            .unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), diagnostics.report());
    }
}
