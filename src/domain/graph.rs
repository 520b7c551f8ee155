//! The in-memory requirements graph.
//!
//! The [`Graph`] knows nothing about the filesystem. It owns every
//! requirement in an arena and addresses them by [`RequirementId`].
//! Relationships are kept twice: as the index literals authored on each
//! requirement, and as resolved handles filled in by [`Graph::link`].

use std::collections::HashMap;

use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};
use tracing::instrument;

use crate::domain::{requirement::Relationship, Diagnostics, Index, Requirement};

/// A stable handle to a requirement inside a [`Graph`].
///
/// Handles survive renumbering; they are only meaningful for the graph that
/// issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequirementId(usize);

/// The outcome of [`Graph::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The requirement was new and has been added.
    Added(RequirementId),
    /// The same requirement (index and source) was already present.
    Existing(RequirementId),
    /// Another requirement already holds this index. The incoming one was
    /// discarded and the conflict noted against the first.
    Duplicate(RequirementId),
}

/// The registry of requirements and their links.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    arena: Vec<Requirement>,
    registry: HashMap<Index, RequirementId>,
    /// Iteration order. Renumbered requirements move to the end.
    order: Vec<RequirementId>,
    /// Placeholders awaiting a permanent index, in first-registration order.
    pending: Vec<Index>,
    translations: HashMap<Index, Index>,
    max_index: u32,
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a requirement to the registry.
    ///
    /// A placeholder index is queued for [`Graph::renumber`]; a permanent one
    /// raises the running maximum. If the index is already taken by a
    /// requirement from a different file, a problem is noted against the
    /// requirement seen first and the incoming one is dropped.
    pub fn insert(&mut self, requirement: Requirement, diagnostics: &mut Diagnostics) -> Insertion {
        if let Some(&existing) = self.registry.get(requirement.index()) {
            let first = &self.arena[existing.0];
            if first.same_identity(&requirement) {
                return Insertion::Existing(existing);
            }

            let second_file = requirement
                .source()
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            diagnostics.index_note(
                first,
                format!("Requirement duplicated  file: {second_file}."),
                true,
            );
            return Insertion::Duplicate(existing);
        }

        let id = RequirementId(self.arena.len());
        let index = requirement.index().clone();
        match index.permanent_value() {
            Some(value) => self.max_index = self.max_index.max(value),
            None => self.pending.push(index.clone()),
        }

        self.registry.insert(index, id);
        self.order.push(id);
        self.arena.push(requirement);
        Insertion::Added(id)
    }

    /// Give every pending placeholder the next permanent index.
    ///
    /// Placeholders are processed in the order they were first registered,
    /// each taking `max + 1`. The renumbered requirement moves to the end of
    /// the iteration order.
    #[instrument(level = "debug", skip_all)]
    pub fn renumber(&mut self, diagnostics: &mut Diagnostics) {
        for placeholder in std::mem::take(&mut self.pending) {
            let Some(&id) = self.registry.get(&placeholder) else {
                continue;
            };

            let Ok(index) = Index::permanent(self.max_index.saturating_add(1)) else {
                diagnostics.index_note(
                    &self.arena[id.0],
                    format!("No permanent index available for placeholder {placeholder}."),
                    true,
                );
                continue;
            };

            self.max_index += 1;
            self.registry.remove(&placeholder);
            self.registry.insert(index.clone(), id);
            self.arena[id.0].index = index.clone();
            self.order.retain(|&other| other != id);
            self.order.push(id);

            tracing::debug!("Renumbered {placeholder} to {index}");
            diagnostics.rename_index(&placeholder, &index);
            self.translations.insert(placeholder, index);
        }
    }

    /// Resolve every requirement's references into links.
    ///
    /// Placeholder references with a known translation are rewritten in
    /// place. References that do not resolve are noted as problems against
    /// the referencing requirement and dropped. Linking is idempotent.
    #[instrument(level = "debug", skip_all)]
    pub fn link(&mut self, diagnostics: &mut Diagnostics) {
        for position in 0..self.order.len() {
            let id = self.order[position];
            self.link_one(id, diagnostics);
        }
    }

    fn link_one(&mut self, id: RequirementId, diagnostics: &mut Diagnostics) {
        for kind in Relationship::ALL {
            let refs = std::mem::take(self.arena[id.0].refs_mut(kind));
            let mut kept: Vec<String> = Vec::with_capacity(refs.len());

            for literal in refs {
                let literal = self.translate(&literal);
                let target = literal
                    .parse::<Index>()
                    .ok()
                    .and_then(|index| self.registry.get(&index).copied());

                match target {
                    None => diagnostics.index_note(
                        &self.arena[id.0],
                        format!("{kind} index not found: {literal}."),
                        true,
                    ),
                    Some(target) if target == id => diagnostics.index_note(
                        &self.arena[id.0],
                        format!("Requirement cannot reference itself: {literal}."),
                        true,
                    ),
                    Some(target) => {
                        self.connect(id, target, kind);
                        if !kept.contains(&literal) {
                            kept.push(literal);
                        }
                    }
                }
            }

            *self.arena[id.0].refs_mut(kind) = kept;
        }
    }

    fn translate(&self, literal: &str) -> String {
        literal
            .parse::<Index>()
            .ok()
            .and_then(|index| self.translations.get(&index))
            .map_or_else(|| literal.to_string(), ToString::to_string)
    }

    fn connect(&mut self, from: RequirementId, to: RequirementId, kind: Relationship) {
        push_unique(self.arena[from.0].links_mut(kind), to);
        push_unique(self.arena[to.0].links_mut(kind.inverse()), from);
        tracing::trace!(
            "Linked {} -> {} ({kind})",
            self.arena[from.0].index(),
            self.arena[to.0].index()
        );
    }

    fn disconnect(&mut self, a: RequirementId, b: RequirementId) {
        for kind in Relationship::ALL {
            self.arena[a.0].links_mut(kind).retain(|&other| other != b);
            self.arena[b.0].links_mut(kind).retain(|&other| other != a);
        }
    }

    /// Add a relationship from `own` to `target` and link the pair.
    ///
    /// Returns `None` without changing anything if `own` is not in the graph,
    /// `target` is not a valid index of a requirement in the graph, or the
    /// two are already related in any way.
    pub fn add_relationship(
        &mut self,
        own: &Index,
        target: &str,
        kind: Relationship,
        diagnostics: &mut Diagnostics,
    ) -> Option<(Index, Index)> {
        let id = self.id_of(own)?;
        let target_index = target.parse::<Index>().ok()?;
        self.id_of(&target_index)?;

        let pair = self.arena[id.0].add_relationship(target, kind)?;
        self.link_one(id, diagnostics);
        Some(pair)
    }

    /// Remove any relationship between `own` and `target`.
    ///
    /// References are removed from both requirements and the resolved links
    /// are severed on both ends. Returns `(target, own)` if anything was
    /// removed.
    pub fn remove_relationship(&mut self, own: &Index, target: &str) -> Option<(Index, Index)> {
        let id = self.id_of(own)?;
        let removed = self.arena[id.0].remove_relationship(target);

        let target_index = target.parse::<Index>().ok()?;
        let Some(target_id) = self.id_of(&target_index) else {
            return removed;
        };

        let own_literal = own.to_string();
        let removed_back = self.arena[target_id.0].remove_relationship(&own_literal);
        let was_linked = Relationship::ALL
            .iter()
            .any(|&kind| self.arena[id.0].links(kind).contains(&target_id));
        self.disconnect(id, target_id);

        if removed.is_some() || removed_back.is_some() || was_linked {
            Some((target_index, own.clone()))
        } else {
            None
        }
    }

    /// Report every parent/child cycle as a problem on each member.
    ///
    /// Returns the cycles found, each sorted.
    pub fn check_cycles(&self, diagnostics: &mut Diagnostics) -> Vec<Vec<Index>> {
        let cycles = self.cycles();
        for cycle in &cycles {
            let members = cycle
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            for index in cycle {
                if let Some(requirement) = self.get(index) {
                    diagnostics.index_note(
                        requirement,
                        format!("Requirement is part of a parent/child cycle: {members}."),
                        true,
                    );
                }
            }
        }
        cycles
    }

    /// All parent/child cycles, as sorted sets of indices.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<Index>> {
        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::with_capacity(self.arena.len(), 0);
        for &id in &self.order {
            graph.add_node(id.0);
            for &child in &self.arena[id.0].children {
                graph.add_edge(id.0, child.0, ());
            }
        }

        let mut cycles: Vec<Vec<Index>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut indices: Vec<Index> = component
                    .iter()
                    .map(|&node| self.arena[node].index().clone())
                    .collect();
                indices.sort();
                indices
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Look up a requirement by index.
    #[must_use]
    pub fn get(&self, index: &Index) -> Option<&Requirement> {
        self.id_of(index).map(|id| &self.arena[id.0])
    }

    /// Look up a requirement by index, for editing.
    ///
    /// Changing text fields and labels through this is safe. Relationships
    /// must go through [`Graph::add_relationship`] and
    /// [`Graph::remove_relationship`] so both ends stay consistent.
    pub fn get_mut(&mut self, index: &Index) -> Option<&mut Requirement> {
        let id = self.id_of(index)?;
        Some(&mut self.arena[id.0])
    }

    /// The handle for an index.
    #[must_use]
    pub fn id_of(&self, index: &Index) -> Option<RequirementId> {
        self.registry.get(index).copied()
    }

    /// The requirement behind a handle issued by this graph.
    ///
    /// # Panics
    ///
    /// Panics if the handle came from a different graph.
    #[must_use]
    pub fn requirement(&self, id: RequirementId) -> &Requirement {
        &self.arena[id.0]
    }

    /// The requirements linked to `requirement` by `kind`, in link order.
    pub fn linked<'a>(
        &'a self,
        requirement: &'a Requirement,
        kind: Relationship,
    ) -> impl Iterator<Item = &'a Requirement> + 'a {
        requirement
            .links(kind)
            .iter()
            .map(move |&id| &self.arena[id.0])
    }

    /// The resolved parents of `requirement`.
    pub fn parents<'a>(&'a self, requirement: &'a Requirement) -> impl Iterator<Item = &'a Requirement> + 'a {
        self.linked(requirement, Relationship::Parent)
    }

    /// The resolved children of `requirement`.
    pub fn children<'a>(&'a self, requirement: &'a Requirement) -> impl Iterator<Item = &'a Requirement> + 'a {
        self.linked(requirement, Relationship::Child)
    }

    /// The resolved related requirements of `requirement`.
    pub fn related<'a>(&'a self, requirement: &'a Requirement) -> impl Iterator<Item = &'a Requirement> + 'a {
        self.linked(requirement, Relationship::Related)
    }

    /// All requirements in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &Requirement> + '_ {
        self.order.iter().map(move |&id| &self.arena[id.0])
    }

    /// All handles in registry order.
    pub fn ids(&self) -> impl Iterator<Item = RequirementId> + '_ {
        self.order.iter().copied()
    }

    /// The number of requirements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the graph holds no requirements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The largest permanent index assigned or seen so far.
    #[must_use]
    pub const fn max_index(&self) -> u32 {
        self.max_index
    }

    /// The permanent index a placeholder was renumbered to.
    #[must_use]
    pub fn translation(&self, placeholder: &Index) -> Option<&Index> {
        self.translations.get(placeholder)
    }
}

fn push_unique(links: &mut Vec<RequirementId>, id: RequirementId) {
    if !links.contains(&id) {
        links.push(id);
    }
}
