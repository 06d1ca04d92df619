//! Core types for the code change pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Path separator used in every relative path handled by the core.
pub const PATH_SEPARATOR: char = '/';

/// Placeholder stored for a file whose annotation request failed.
pub const ANNOTATION_SENTINEL: &str = "Error fetching docstring.";

/// Relative path (first segment is the uploaded folder name) -> annotation text
pub type AnnotationMap = BTreeMap<String, String>;

/// Relative path -> rationale for selecting the file
pub type SelectionMap = BTreeMap<String, String>;

/// Relative path -> original text content
pub type OriginalFilesMap = BTreeMap<String, String>;

/// Relative path -> raw generated text (prose plus fenced code)
pub type ChangedFilesMap = BTreeMap<String, String>;

/// Low-level change plan produced by the plan analysis service.
///
/// Immutable once created; passed by reference between stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangePlan(String);

impl ChangePlan {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ChangePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Feature description assembled from typed text and an optional uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureDescription(String);

impl FeatureDescription {
    /// Merge typed text with file text.
    ///
    /// Both present: joined by a blank line. Otherwise whichever is non-empty.
    /// Returns `None` when there is nothing to merge.
    pub fn merge(typed: &str, file_text: Option<&str>) -> Option<Self> {
        let typed = typed.trim();
        let file_text = file_text.unwrap_or_default();
        match (typed.is_empty(), file_text.is_empty()) {
            (true, true) => None,
            (false, false) => Some(Self(format!("{}\n\n{}", typed, file_text))),
            (false, true) => Some(Self(typed.to_string())),
            (true, false) => Some(Self(file_text.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
