//! Plan Selector
//!
//! Asks the selection service which files are relevant to a change plan.

use crate::backend::PipelineBackend;
use crate::types::{AnnotationMap, ChangePlan, SelectionMap};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct PlanSelector {
    backend: Arc<dyn PipelineBackend>,
}

impl PlanSelector {
    pub fn new(backend: Arc<dyn PipelineBackend>) -> Self {
        Self { backend }
    }

    /// Select the files relevant to `plan`.
    ///
    /// `None` means selection is unavailable (bad input or service failure),
    /// which is different from an empty selection.
    pub async fn select(
        &self,
        plan: &ChangePlan,
        annotations: &AnnotationMap,
    ) -> Option<SelectionMap> {
        if plan.is_blank() {
            warn!("Selection skipped: change plan is empty");
            return None;
        }
        if annotations.is_empty() {
            warn!("Selection skipped: no annotations");
            return None;
        }

        let response = match self.backend.select_files(plan.as_str(), annotations).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Selection request failed");
                return None;
            }
        };
        let status = response.status.clone();
        let Some(selection) = response.into_selection() else {
            error!(status = %status, "Selection service did not report success");
            return None;
        };

        for path in selection.keys().filter(|path| !annotations.contains_key(*path)) {
            warn!(path = %path, "Selected path has no annotation");
        }
        info!(selected = selection.len(), "Selection complete");
        Some(selection)
    }
}
