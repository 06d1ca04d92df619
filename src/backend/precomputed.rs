//! Precomputed artifacts
//!
//! A backend may publish annotation and selection maps computed ahead of
//! time. They are only usable as a pair: if either fetch fails the pair is
//! discarded.

use super::PipelineBackend;
use crate::error::ApiError;
use crate::types::{AnnotationMap, SelectionMap};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecomputedArtifacts {
    pub annotations: AnnotationMap,
    pub selection: SelectionMap,
}

/// Fetch both artifacts concurrently; fails if either fetch fails.
pub async fn fetch_precomputed(
    backend: &dyn PipelineBackend,
) -> Result<PrecomputedArtifacts, ApiError> {
    let (annotations, selection) = futures::try_join!(
        backend.fetch_precomputed_annotations(),
        backend.fetch_precomputed_selection()
    )?;
    info!(
        annotations = annotations.len(),
        selected = selection.len(),
        "Loaded precomputed artifacts"
    );
    Ok(PrecomputedArtifacts {
        annotations,
        selection,
    })
}
