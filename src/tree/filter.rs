//! Hidden-entry filtering
//!
//! A path is hidden when any of its segments starts with [`HIDDEN_MARKER`].
//! Hidden paths never enter the tree or the annotation batch.

use crate::types::PATH_SEPARATOR;

/// Leading character that marks a hidden entry
pub const HIDDEN_MARKER: char = '.';

pub fn is_hidden_segment(segment: &str) -> bool {
    segment.starts_with(HIDDEN_MARKER)
}

/// True if any segment is hidden
pub fn is_hidden<'a>(segments: impl IntoIterator<Item = &'a str>) -> bool {
    segments.into_iter().any(is_hidden_segment)
}

/// True if no segment of a separator-joined path is hidden
pub fn is_visible_path(path: &str) -> bool {
    !is_hidden(path.split(PATH_SEPARATOR))
}
