//! The external key/value form of a requirement.
//!
//! A folio is a YAML mapping from index to record:
//!
//! ```yaml
//! r00000001:
//!   type: customer
//!   title: Widgets
//!   requirement: The widget shall spin.
//!   label:
//!   - critical
//!   child_idx:
//!   - new1
//! ```

use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{requirement::CUSTOMER_KIND, Index, Requirement};

/// A requirement as stored in a folio, without its index (the map key).
///
/// Missing keys take their defaults. On output, empty strings and empty
/// lists are omitted, except `child_idx`, which is always written for a
/// customer requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecordRepr", into = "RecordRepr")]
pub struct RequirementRecord {
    /// Soft-delete flag.
    pub enabled: bool,
    /// Classification tag (`type`).
    pub kind: String,
    /// Title.
    pub title: String,
    /// The requirement statement.
    pub requirement: String,
    /// Description.
    pub description: String,
    /// Assumptions.
    pub assumptions: String,
    /// Component scope.
    pub component: String,
    /// Labels.
    pub label: Vec<String>,
    /// Parent index references.
    pub parent_idx: Vec<String>,
    /// Child index references.
    pub child_idx: Vec<String>,
    /// Related index references.
    pub related_idx: Vec<String>,
}

impl Default for RequirementRecord {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: String::new(),
            title: String::new(),
            requirement: String::new(),
            description: String::new(),
            assumptions: String::new(),
            component: String::new(),
            label: Vec::new(),
            parent_idx: Vec::new(),
            child_idx: Vec::new(),
            related_idx: Vec::new(),
        }
    }
}

/// Errors converting between records and YAML.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The YAML value does not have the shape of a record.
    #[error("failed to decode requirement record")]
    Decode(#[source] serde_yaml::Error),
    /// The record could not be rendered as YAML.
    #[error("failed to encode requirement record")]
    Encode(#[source] serde_yaml::Error),
}

impl RequirementRecord {
    /// Decode a record from a parsed YAML value. A null value is an empty
    /// record.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Decode`] if the value is not a mapping of the
    /// expected keys and types.
    pub fn from_value(value: serde_yaml::Value) -> Result<Self, RecordError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(value).map_err(RecordError::Decode)
    }

    /// Render the record as a single-entry YAML mapping keyed by `index`,
    /// without a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Encode`] if serialization fails.
    pub fn to_yaml(&self, index: &Index) -> Result<String, RecordError> {
        let mut entry = BTreeMap::new();
        entry.insert(index.to_string(), self);
        let text = serde_yaml::to_string(&entry).map_err(RecordError::Encode)?;
        Ok(text.trim_end().to_string())
    }
}

impl RequirementRecord {
    /// Build the requirement this record describes.
    ///
    /// The `type` and labels are lower-cased; labels and references are
    /// de-duplicated keeping first occurrence order.
    #[must_use]
    pub fn into_requirement(self, index: Index, source: impl Into<PathBuf>) -> Requirement {
        let mut requirement = Requirement::new(index, source);
        requirement.enabled = self.enabled;
        requirement.kind = self.kind.to_lowercase();
        requirement.title = self.title;
        requirement.statement = self.requirement;
        requirement.description = self.description;
        requirement.assumptions = self.assumptions;
        requirement.component = self.component;
        requirement.labels = self.label.iter().map(|label| label.to_lowercase()).collect();
        requirement.parent_refs = dedup(self.parent_idx);
        requirement.child_refs = dedup(self.child_idx);
        requirement.related_refs = dedup(self.related_idx);
        requirement
    }
}

impl From<&Requirement> for RequirementRecord {
    fn from(requirement: &Requirement) -> Self {
        Self {
            enabled: requirement.enabled,
            kind: requirement.kind.clone(),
            title: requirement.title.clone(),
            requirement: requirement.statement.clone(),
            description: requirement.description.clone(),
            assumptions: requirement.assumptions.clone(),
            component: requirement.component.clone(),
            label: requirement.labels.iter().cloned().collect(),
            parent_idx: requirement.parent_refs.clone(),
            child_idx: requirement.child_refs.clone(),
            related_idx: requirement.related_refs.clone(),
        }
    }
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(items.len());
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

/// The serialized layout. Every key is optional so that `key:` with no
/// value reads as the default.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordRepr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    requirement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assumptions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_idx: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    child_idx: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    related_idx: Option<Vec<String>>,
}

impl From<RecordRepr> for RequirementRecord {
    fn from(repr: RecordRepr) -> Self {
        Self {
            enabled: repr.enabled.unwrap_or(true),
            kind: repr.kind.unwrap_or_default(),
            title: repr.title.unwrap_or_default(),
            requirement: repr.requirement.unwrap_or_default(),
            description: repr.description.unwrap_or_default(),
            assumptions: repr.assumptions.unwrap_or_default(),
            component: repr.component.unwrap_or_default(),
            label: repr.label.unwrap_or_default(),
            parent_idx: repr.parent_idx.unwrap_or_default(),
            child_idx: repr.child_idx.unwrap_or_default(),
            related_idx: repr.related_idx.unwrap_or_default(),
        }
    }
}

impl From<RequirementRecord> for RecordRepr {
    fn from(record: RequirementRecord) -> Self {
        let customer = record.kind.eq_ignore_ascii_case(CUSTOMER_KIND);
        let child_idx = if customer || !record.child_idx.is_empty() {
            Some(record.child_idx)
        } else {
            None
        };

        Self {
            enabled: (!record.enabled).then_some(false),
            kind: non_empty(record.kind),
            title: non_empty(record.title),
            requirement: non_empty(record.requirement),
            description: non_empty(record.description),
            assumptions: non_empty(record.assumptions),
            component: non_empty(record.component),
            label: non_empty_list(record.label),
            parent_idx: non_empty_list(record.parent_idx),
            child_idx,
            related_idx: non_empty_list(record.related_idx),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn non_empty_list(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then_some(values)
}
