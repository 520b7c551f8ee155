//! Requirements kept as YAML folios.
//!
//! A project holds a `project/` tree and an optional `customer/` tree of
//! YAML files ("folios"), each mapping requirement indices to records. A
//! [`Standard`] reads them all, gives new requirements permanent indices,
//! links their cross-references into a [`Graph`], and writes edits back.
//! Problems found on the way are collected in [`Diagnostics`] rather than
//! aborting the load. A [`Tree`] projects the graph into filtered, ordered
//! views.

pub mod domain;
pub use domain::{
    Config, Diagnostics, Graph, Index, OutlineEntry, Relationship, Requirement, Tree, TreeFilter,
};

/// Filesystem storage: folios and the standard built from them.
pub mod storage;
pub use storage::{Folio, Standard};
