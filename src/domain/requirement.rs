use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::domain::{graph::RequirementId, Index};

/// Labels longer than this are rejected by [`Requirement::add_label`].
pub const LABEL_MAX_LEN: usize = 64;

/// The `type` tag marking a customer requirement.
pub const CUSTOMER_KIND: &str = "customer";

/// A single requirement record.
///
/// A requirement carries its identity, classification, free text, labels,
/// and two views of its relationships:
/// - the raw index literals as authored (`parent_idx`, `child_idx`,
///   `related_idx`)
/// - the resolved links, populated by the [`Graph`](crate::Graph) when it
///   links the registry. These are handles into the graph, in link order.
///
/// Empty strings stand for "unset"; there are no optional text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub(crate) index: Index,
    pub(crate) source: PathBuf,
    pub(crate) enabled: bool,
    pub(crate) kind: String,
    pub(crate) title: String,
    pub(crate) statement: String,
    pub(crate) description: String,
    pub(crate) assumptions: String,
    pub(crate) component: String,
    pub(crate) labels: BTreeSet<String>,
    pub(crate) parent_refs: Vec<String>,
    pub(crate) child_refs: Vec<String>,
    pub(crate) related_refs: Vec<String>,
    pub(crate) parents: Vec<RequirementId>,
    pub(crate) children: Vec<RequirementId>,
    pub(crate) related: Vec<RequirementId>,
}

/// The kind of relationship between two requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relationship {
    /// The target is a parent of this requirement.
    Parent,
    /// The target is a child of this requirement.
    Child,
    /// The two requirements are related (symmetric).
    Related,
}

impl Relationship {
    /// All relationship kinds, in link order.
    pub const ALL: [Self; 3] = [Self::Parent, Self::Child, Self::Related];

    /// The record key holding references of this kind.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Parent => "parent_idx",
            Self::Child => "child_idx",
            Self::Related => "related_idx",
        }
    }

    /// The kind as seen from the other end of the link.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Parent => Self::Child,
            Self::Child => Self::Parent,
            Self::Related => Self::Related,
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parent => write!(f, "Parent"),
            Self::Child => write!(f, "Child"),
            Self::Related => write!(f, "Related"),
        }
    }
}

impl FromStr for Relationship {
    type Err = UnknownRelationship;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parent" => Ok(Self::Parent),
            "child" => Ok(Self::Child),
            "related" => Ok(Self::Related),
            _ => Err(UnknownRelationship(s.to_string())),
        }
    }
}

/// Returned when a relationship name is not `parent`, `child`, or `related`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown relationship '{0}': expected parent, child, or related")]
pub struct UnknownRelationship(String);

impl Requirement {
    /// Creates an empty, enabled requirement read from `source`.
    #[must_use]
    pub fn new(index: Index, source: impl Into<PathBuf>) -> Self {
        Self {
            index,
            source: source.into(),
            enabled: true,
            kind: String::new(),
            title: String::new(),
            statement: String::new(),
            description: String::new(),
            assumptions: String::new(),
            component: String::new(),
            labels: BTreeSet::new(),
            parent_refs: Vec::new(),
            child_refs: Vec::new(),
            related_refs: Vec::new(),
            parents: Vec::new(),
            children: Vec::new(),
            related: Vec::new(),
        }
    }

    /// The requirement's index.
    #[must_use]
    pub const fn index(&self) -> &Index {
        &self.index
    }

    /// The folio this requirement was read from.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Whether the requirement is enabled. Disabled requirements stay in the
    /// graph.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the requirement.
    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// The classification tag, lower-cased.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Set the classification tag. It is stored lower-cased.
    pub fn set_kind(&mut self, kind: &str) {
        self.kind = kind.to_lowercase();
    }

    /// Whether this is a customer requirement.
    #[must_use]
    pub fn is_customer(&self) -> bool {
        self.kind == CUSTOMER_KIND
    }

    /// The customer a customer requirement belongs to: the stem of its
    /// folio's file name.
    #[must_use]
    pub fn customer_name(&self) -> Option<&str> {
        if !self.is_customer() {
            return None;
        }
        self.source.file_stem().and_then(|stem| stem.to_str())
    }

    /// The title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// The requirement statement (`requirement` in the record).
    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Set the requirement statement.
    pub fn set_statement(&mut self, statement: impl Into<String>) {
        self.statement = statement.into();
    }

    /// The description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Set the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// The assumptions.
    #[must_use]
    pub fn assumptions(&self) -> &str {
        &self.assumptions
    }

    /// Set the assumptions.
    pub fn set_assumptions(&mut self, assumptions: impl Into<String>) {
        self.assumptions = assumptions.into();
    }

    /// The component this requirement is scoped to, if any.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Set the component.
    pub fn set_component(&mut self, component: impl Into<String>) {
        self.component = component.into();
    }

    /// The labels, lower-cased and sorted.
    #[must_use]
    pub const fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// Add a label.
    ///
    /// Returns `false` without changing anything if the label is empty,
    /// longer than [`LABEL_MAX_LEN`], or already present. Bad input from an
    /// edit session is ignored rather than reported.
    pub fn add_label(&mut self, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() || label.chars().count() > LABEL_MAX_LEN {
            return false;
        }
        self.labels.insert(label.to_lowercase())
    }

    /// Remove a label. Returns `false` if it was not present.
    pub fn remove_label(&mut self, label: &str) -> bool {
        self.labels.remove(&label.trim().to_lowercase())
    }

    /// The raw references of the given kind, as authored (after any
    /// placeholder translation during linking).
    #[must_use]
    pub fn refs(&self, kind: Relationship) -> &[String] {
        match kind {
            Relationship::Parent => &self.parent_refs,
            Relationship::Child => &self.child_refs,
            Relationship::Related => &self.related_refs,
        }
    }

    pub(crate) const fn refs_mut(&mut self, kind: Relationship) -> &mut Vec<String> {
        match kind {
            Relationship::Parent => &mut self.parent_refs,
            Relationship::Child => &mut self.child_refs,
            Relationship::Related => &mut self.related_refs,
        }
    }

    pub(crate) fn links(&self, kind: Relationship) -> &[RequirementId] {
        match kind {
            Relationship::Parent => &self.parents,
            Relationship::Child => &self.children,
            Relationship::Related => &self.related,
        }
    }

    pub(crate) const fn links_mut(&mut self, kind: Relationship) -> &mut Vec<RequirementId> {
        match kind {
            Relationship::Parent => &mut self.parents,
            Relationship::Child => &mut self.children,
            Relationship::Related => &mut self.related,
        }
    }

    /// Whether `target` appears in any of the three reference sets.
    #[must_use]
    pub fn references(&self, target: &str) -> bool {
        Relationship::ALL
            .iter()
            .any(|&kind| self.refs(kind).iter().any(|r| r == target))
    }

    /// Record a new relationship reference to `target`.
    ///
    /// Returns `None` and changes nothing when `target` is not a valid
    /// index, is this requirement's own index, or is already referenced in
    /// any relationship set (a requirement cannot be both parent and child
    /// of another). On success returns `(target, own index)` so the caller
    /// can link the pair.
    pub fn add_relationship(&mut self, target: &str, kind: Relationship) -> Option<(Index, Index)> {
        let target_index = target.parse::<Index>().ok()?;
        if target_index == self.index || self.references(target) {
            return None;
        }
        self.refs_mut(kind).push(target.to_string());
        Some((target_index, self.index.clone()))
    }

    /// Remove every reference to `target` from the three relationship sets.
    ///
    /// Returns `(target, own index)` if anything was removed. Severing the
    /// resolved links on both ends is done by the graph, which owns them.
    pub fn remove_relationship(&mut self, target: &str) -> Option<(Index, Index)> {
        let target_index = target.parse::<Index>().ok()?;
        let mut removed = false;
        for kind in Relationship::ALL {
            let refs = self.refs_mut(kind);
            let before = refs.len();
            refs.retain(|r| r != target);
            removed |= refs.len() != before;
        }
        removed.then(|| (target_index, self.index.clone()))
    }

    /// Two requirements share an identity when both index and source match.
    ///
    /// The same index read from a different file is a conflict, not the
    /// same requirement.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.index == other.index && self.source == other.source
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Requirement({})", self.index)
    }
}
