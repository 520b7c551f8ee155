//! A filesystem backed set of requirements.
//!
//! The [`Standard`] finds every folio under a project root, aggregates their
//! requirements into one [`Graph`], and writes edits back through the folios.
//! It is a wrapper around the filesystem agnostic graph.
//!
//! Expected layout:
//!
//! ```text
//! <root>/
//!   config.yaml
//!   project/**/*.yaml
//!   customer/**/*.yaml   (optional)
//! ```

use std::{
    collections::HashMap,
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::instrument;
use walkdir::WalkDir;

use crate::{
    domain::{
        config::{ConfigError, CONFIG_FILE_NAME},
        index,
        requirement::Relationship,
        Config, Diagnostics, Graph, Index, Insertion, Requirement, Tree, TreeFilter,
    },
    storage::Folio,
};

/// The sub-directory holding project folios.
pub const PROJECT_DIR: &str = "project";

/// The sub-directory holding customer folios.
pub const CUSTOMER_DIR: &str = "customer";

/// The extension of folio files.
pub const FOLIO_EXTENSION: &str = "yaml";

/// The aggregate of every folio in a project.
#[derive(Debug)]
pub struct Standard {
    name: String,
    root: Option<PathBuf>,
    project_path: Option<PathBuf>,
    customer_path: Option<PathBuf>,
    config: Option<Config>,
    folios: Vec<Folio>,
    folio_lookup: HashMap<PathBuf, usize>,
    graph: Graph,
    diagnostics: Diagnostics,
}

/// Errors from [`Standard::read`].
///
/// Problems with the content of the project never surface here; they are
/// collected in the [`Diagnostics`].
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The path given is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The standard has already been read. Create a new one instead.
    #[error("standard has already been read from {0}")]
    AlreadyRead(PathBuf),
}

impl Default for Standard {
    fn default() -> Self {
        Self::new("Working")
    }
}

impl Standard {
    /// Creates an empty standard.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root: None,
            project_path: None,
            customer_path: None,
            config: None,
            folios: Vec::new(),
            folio_lookup: HashMap::new(),
            graph: Graph::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Read every folio under `directory`.
    ///
    /// Loading is best-effort. Problems with the configuration, the layout,
    /// individual files or references are noted in [`Standard::diagnostics`]
    /// and the rest of the project still loads.
    ///
    /// # Errors
    ///
    /// Returns an error if `directory` is not a directory, or if this
    /// standard has already been read.
    #[instrument(skip(self), fields(name = %self.name))]
    pub fn read(&mut self, directory: &Path) -> Result<&mut Self, ReadError> {
        if let Some(root) = &self.root {
            return Err(ReadError::AlreadyRead(root.clone()));
        }
        if !directory.is_dir() {
            return Err(ReadError::NotADirectory(directory.to_path_buf()));
        }

        self.root = Some(directory.to_path_buf());
        self.diagnostics.set_root(directory);

        self.load_config(directory);
        self.resolve_paths(directory);
        let drafts = self.discover_folios();
        self.aggregate(drafts);
        self.graph.renumber(&mut self.diagnostics);
        self.graph.link(&mut self.diagnostics);
        self.graph.check_cycles(&mut self.diagnostics);

        tracing::debug!(
            "Read {} requirements from {} folios",
            self.graph.len(),
            self.folios.len()
        );
        Ok(self)
    }

    #[instrument(level = "debug", skip(self))]
    fn load_config(&mut self, directory: &Path) {
        let path = directory.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            self.diagnostics.note(
                "Config file not found. config.yaml should be at project root.",
                true,
            );
            return;
        }

        match Config::load(&path) {
            Ok(config) => self.config = Some(config),
            Err(error @ ConfigError::Parse { .. }) => {
                tracing::debug!("{error}");
                self.diagnostics.note("Error parsing config file.", true);
            }
            Err(error @ (ConfigError::Io { .. } | ConfigError::Encode { .. })) => {
                tracing::debug!("{error}");
                self.diagnostics.note("Error reading config file.", true);
            }
        }
    }

    #[instrument(level = "debug", skip(self))]
    fn resolve_paths(&mut self, directory: &Path) {
        let project = directory.join(PROJECT_DIR);
        if project.is_dir() {
            self.project_path = Some(project);
        } else {
            self.diagnostics
                .note("Project path not found at project root.", true);
        }

        let customer = directory.join(CUSTOMER_DIR);
        if customer.is_dir() {
            self.customer_path = Some(customer);
        } else {
            self.diagnostics
                .note("Customer path not found at project root.", false);
        }
    }

    /// Find, read and parse every folio. Only folios that parse into at
    /// least one requirement are kept. Returns their draft requirements.
    #[instrument(level = "debug", skip(self))]
    fn discover_folios(&mut self) -> Vec<Vec<Requirement>> {
        let roots: Vec<&PathBuf> = self
            .project_path
            .iter()
            .chain(self.customer_path.iter())
            .collect();
        if roots.is_empty() {
            self.diagnostics
                .note("No project or customer path found.", true);
            return Vec::new();
        }

        let paths: Vec<PathBuf> = roots
            .into_iter()
            .flat_map(|root| collect_folio_paths(root))
            .collect();

        // reads run in parallel; notes are applied below in discovery order
        let contents: Vec<_> = paths
            .into_par_iter()
            .map(|path| {
                let content = fs::read_to_string(&path);
                (path, content)
            })
            .collect();

        let mut drafts = Vec::with_capacity(contents.len());
        for (path, content) in contents {
            let mut folio = Folio::from_read(path, content, &mut self.diagnostics);
            let requirements = folio.parse(false, &mut self.diagnostics);
            if folio.valid() {
                tracing::debug!("Found folio {}", folio.path().display());
                self.add_folio(folio);
                drafts.push(requirements);
            }
        }

        if self.folios.is_empty() {
            self.diagnostics.note("No requirement files found.", true);
        }

        drafts
    }

    fn add_folio(&mut self, folio: Folio) -> usize {
        if let Some(&position) = self.folio_lookup.get(folio.path()) {
            return position;
        }
        let position = self.folios.len();
        self.folio_lookup.insert(folio.path().to_path_buf(), position);
        self.folios.push(folio);
        position
    }

    #[instrument(level = "debug", skip_all)]
    fn aggregate(&mut self, drafts: Vec<Vec<Requirement>>) {
        if self.folios.is_empty() {
            self.diagnostics.note(
                "Requirements cannot be added if there are no requirement files.",
                false,
            );
            return;
        }

        for requirement in drafts.into_iter().flatten() {
            self.graph.insert(requirement, &mut self.diagnostics);
        }
    }

    /// Write every requirement back to its folio.
    ///
    /// Folios whose rendered text is unchanged are not touched. Returns the
    /// number of files written.
    #[instrument(skip(self), fields(name = %self.name))]
    pub fn write(&mut self) -> usize {
        for id in self.graph.ids() {
            let source = self.graph.requirement(id).source();
            if let Some(&position) = self.folio_lookup.get(source) {
                self.folios[position].bind(id);
            }
        }

        let written = self
            .folios
            .iter_mut()
            .map(|folio| folio.write(&self.graph, &mut self.diagnostics))
            .filter(|&written| written)
            .count();
        tracing::info!("Wrote {written} of {} folios", self.folios.len());
        written
    }

    /// Add a requirement, then renumber and relink so the graph stays
    /// consistent.
    ///
    /// A requirement whose source is not a known folio gets a new folio,
    /// created on the next write.
    pub fn add_requirement(&mut self, requirement: Requirement) -> Insertion {
        let source = requirement.source().to_path_buf();
        let insertion = self.graph.insert(requirement, &mut self.diagnostics);
        if let Insertion::Added(_) = insertion {
            if !self.folio_lookup.contains_key(&source) {
                self.add_folio(Folio::create(source));
            }
            self.graph.renumber(&mut self.diagnostics);
            self.graph.link(&mut self.diagnostics);
        }
        insertion
    }

    /// Look up a requirement.
    ///
    /// A placeholder that was renumbered during the read finds the
    /// requirement under its new index.
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is not a well-formed index.
    pub fn get(&self, index: &str) -> Result<Option<&Requirement>, index::Error> {
        let index = self.resolve(index)?;
        Ok(self.graph.get(&index))
    }

    /// Look up a requirement for editing. See [`Graph::get_mut`].
    ///
    /// # Errors
    ///
    /// Returns an error if `index` is not a well-formed index.
    pub fn requirement_mut(&mut self, index: &str) -> Result<Option<&mut Requirement>, index::Error> {
        let index = self.resolve(index)?;
        Ok(self.graph.get_mut(&index))
    }

    fn resolve(&self, index: &str) -> Result<Index, index::Error> {
        let index: Index = index.parse()?;
        Ok(self.graph.translation(&index).cloned().unwrap_or(index))
    }

    /// Relate `own` to `target`. See [`Graph::add_relationship`].
    ///
    /// # Errors
    ///
    /// Returns an error if `own` is not a well-formed index. A bad `target`
    /// is a silent no-op.
    pub fn add_relationship(
        &mut self,
        own: &str,
        target: &str,
        kind: Relationship,
    ) -> Result<Option<(Index, Index)>, index::Error> {
        let own = self.resolve(own)?;
        let target = self.resolve(target).map_or_else(|_| target.to_string(), |t| t.to_string());
        Ok(self
            .graph
            .add_relationship(&own, &target, kind, &mut self.diagnostics))
    }

    /// Remove any relationship between `own` and `target`. See
    /// [`Graph::remove_relationship`].
    ///
    /// # Errors
    ///
    /// Returns an error if `own` is not a well-formed index.
    pub fn remove_relationship(
        &mut self,
        own: &str,
        target: &str,
    ) -> Result<Option<(Index, Index)>, index::Error> {
        let own = self.resolve(own)?;
        let target = self.resolve(target).map_or_else(|_| target.to_string(), |t| t.to_string());
        Ok(self.graph.remove_relationship(&own, &target))
    }

    /// All requirements, in registry order.
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> + '_ {
        self.graph.iter()
    }

    /// A filtered view of the requirements.
    #[must_use]
    pub fn tree<'a>(&'a self, filter: &'a TreeFilter) -> Tree<'a> {
        Tree::new(&self.graph, filter)
    }

    /// The number of folios read.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.folios.len()
    }

    /// The folio paths, in discovery order.
    pub fn folio_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.folios.iter().map(Folio::path)
    }

    /// The folio paths relative to the working directory where possible.
    #[must_use]
    pub fn folio_relative_paths(&self) -> Vec<PathBuf> {
        let cwd = std::env::current_dir().ok();
        self.folio_paths()
            .map(|path| {
                cwd.as_deref()
                    .and_then(|cwd| path.strip_prefix(cwd).ok())
                    .unwrap_or(path)
                    .to_path_buf()
            })
            .collect()
    }

    /// The name given to this standard.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The directory the standard was read from.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// The project configuration, if one was read.
    #[must_use]
    pub const fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    /// The underlying graph.
    #[must_use]
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The notes collected so far.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

fn collect_folio_paths(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension() == Some(OsStr::new(FOLIO_EXTENSION)))
        .map(walkdir::DirEntry::into_path)
        .collect()
}
