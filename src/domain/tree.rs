//! A filtered, ordered projection of the [`Graph`].
//!
//! The [`Tree`] borrows a linked graph and a [`TreeFilter`] and answers two
//! questions: which requirements are roots of the view, and which children
//! of a requirement are shown. [`Tree::outline`] walks both depth-first to
//! produce numbered rows for tables of contents and summaries.

use std::num::NonZeroUsize;

use crate::domain::{Graph, Index, Requirement, TreeFilter};

/// A read-only view of a graph under a filter.
#[derive(Debug, Clone, Copy)]
pub struct Tree<'a> {
    graph: &'a Graph,
    filter: &'a TreeFilter,
}

/// One row of an outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry<'a> {
    /// One-based, dot-separated position, e.g. `1.2.1`.
    pub number: String,
    /// Depth of the row; roots are at depth 1.
    pub depth: usize,
    /// The requirement at this position.
    pub requirement: &'a Requirement,
}

impl OutlineEntry<'_> {
    /// The index of the requirement at this position.
    #[must_use]
    pub const fn index(&self) -> &Index {
        self.requirement.index()
    }
}

impl<'a> Tree<'a> {
    /// Creates a view of `graph` under `filter`.
    #[must_use]
    pub const fn new(graph: &'a Graph, filter: &'a TreeFilter) -> Self {
        Self { graph, filter }
    }

    /// The filter this view applies.
    #[must_use]
    pub const fn filter(&self) -> &'a TreeFilter {
        self.filter
    }

    /// The roots of the view, in registry order.
    #[must_use]
    pub fn top(&self) -> Vec<&'a Requirement> {
        self.graph
            .iter()
            .filter(|requirement| self.filter.is_top_level(self.graph, requirement))
            .collect()
    }

    /// The children of `requirement` shown in this view, in link order.
    ///
    /// A child must be a project requirement or belong to the customer in
    /// scope. Among those, a child carrying a label from the inclusion set is
    /// kept, a child carrying only other labels is dropped, and a child with
    /// no labels is kept.
    #[must_use]
    pub fn children(&self, requirement: &'a Requirement) -> Vec<&'a Requirement> {
        let (matched, unmatched) = self.filter.child_labels(self.graph, requirement);

        self.graph
            .children(requirement)
            .filter(|child| self.filter.is_project_or_customer(child))
            .filter(|child| {
                TreeFilter::has_label(child, &matched) || !TreeFilter::has_label(child, &unmatched)
            })
            .collect()
    }

    /// Walk the view depth-first, numbering each row.
    ///
    /// Rows deeper than `max_depth` are not produced. A requirement that is
    /// already on the current path is skipped, so parent/child cycles cannot
    /// recurse forever. Numbers are computed fresh on every call.
    #[must_use]
    pub fn outline(&self, max_depth: NonZeroUsize) -> Vec<OutlineEntry<'a>> {
        let mut entries = Vec::new();
        let mut path: Vec<&Index> = Vec::new();
        for (position, requirement) in self.top().into_iter().enumerate() {
            self.walk(
                requirement,
                (position + 1).to_string(),
                1,
                max_depth.get(),
                &mut path,
                &mut entries,
            );
        }
        entries
    }

    fn walk(
        &self,
        requirement: &'a Requirement,
        number: String,
        depth: usize,
        max_depth: usize,
        path: &mut Vec<&'a Index>,
        entries: &mut Vec<OutlineEntry<'a>>,
    ) {
        entries.push(OutlineEntry {
            number: number.clone(),
            depth,
            requirement,
        });

        if depth >= max_depth {
            return;
        }

        path.push(requirement.index());
        let children: Vec<&'a Requirement> = self
            .children(requirement)
            .into_iter()
            .filter(|child| !path.contains(&child.index()))
            .collect();
        for (position, child) in children.into_iter().enumerate() {
            self.walk(
                child,
                format!("{number}.{}", position + 1),
                depth + 1,
                max_depth,
                path,
                entries,
            );
        }
        path.pop();
    }
}
