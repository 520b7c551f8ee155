//! Domain models for requirements management.
//!
//! Everything here is independent of the filesystem: requirement records,
//! their indices, the linked graph, filtered views of it, and the notes
//! collected while building it.

/// Project configuration.
pub mod config;
pub use config::{Config, ConfigError};

/// Validation notes and the report built from them.
pub mod diagnostics;
pub use diagnostics::Diagnostics;

mod filter;
pub use filter::{FilterError, TreeFilter};

/// The requirements graph.
pub mod graph;
pub use graph::{Graph, Insertion, RequirementId};

/// Requirement indices.
pub mod index;
pub use index::Index;

/// The requirement record.
pub mod requirement;
pub use requirement::{Relationship, Requirement};

mod tree;
pub use tree::{OutlineEntry, Tree};
