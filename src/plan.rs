//! Plan analysis: feature description in, low-level change plan out.

use crate::backend::PipelineBackend;
use crate::types::{ChangePlan, FeatureDescription};
use std::sync::Arc;
use tracing::{error, info};

pub struct PlanAnalyzer {
    backend: Arc<dyn PipelineBackend>,
}

impl PlanAnalyzer {
    pub fn new(backend: Arc<dyn PipelineBackend>) -> Self {
        Self { backend }
    }

    /// `None` when the service fails or answers with a blank plan.
    pub async fn analyze(&self, description: &FeatureDescription) -> Option<ChangePlan> {
        match self.backend.analyze_feature(description.as_str()).await {
            Ok(analysis) => {
                let plan = ChangePlan::new(analysis);
                if plan.is_blank() {
                    error!("Plan analysis returned an empty plan");
                    return None;
                }
                info!(chars = plan.as_str().len(), "Change plan received");
                Some(plan)
            }
            Err(e) => {
                error!(error = %e, "Plan analysis failed");
                None
            }
        }
    }
}
