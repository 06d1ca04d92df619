//! Backend Service
//!
//! The plan analysis, file selection and change generation services live
//! behind one HTTP backend. The pipeline talks to it through
//! [`PipelineBackend`] so stages can be exercised against in-process fakes.

pub mod http;
pub mod precomputed;
pub mod wire;

use crate::error::ApiError;
use crate::types::{AnnotationMap, ChangedFilesMap, OriginalFilesMap, SelectionMap};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpBackend;
pub use precomputed::{fetch_precomputed, PrecomputedArtifacts};
pub use wire::SelectionResponse;

/// Backend endpoints and timeouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub paths: BackendPaths,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            paths: BackendPaths::default(),
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<(), String> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err("backend.base_url must not be empty".to_string());
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(format!("backend.base_url must be an http(s) URL: {}", base));
        }
        if self.timeout_secs == 0 {
            return Err("backend.timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Endpoint paths, relative to the base URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendPaths {
    pub analyze: String,
    pub save_annotations: String,
    pub select: String,
    pub generate: String,
    pub precomputed_annotations: String,
    pub precomputed_selection: String,
}

impl Default for BackendPaths {
    fn default() -> Self {
        Self {
            analyze: "/convert_high_to_low".to_string(),
            save_annotations: "/api/saveDocstrings".to_string(),
            select: "/api/saveTopR".to_string(),
            generate: "/generate_changed_files".to_string(),
            precomputed_annotations: "/docstrings.json".to_string(),
            precomputed_selection: "/topR.json".to_string(),
        }
    }
}

/// Remote services used by the pipeline stages
#[async_trait]
pub trait PipelineBackend: Send + Sync {
    /// Turn a feature description into a low-level change plan.
    async fn analyze_feature(&self, description: &str) -> Result<String, ApiError>;

    /// Persist the annotation map. Best-effort from the caller's view.
    async fn save_annotations(&self, annotations: &AnnotationMap) -> Result<(), ApiError>;

    /// Rank files against the plan.
    async fn select_files(
        &self,
        plan: &str,
        annotations: &AnnotationMap,
    ) -> Result<SelectionResponse, ApiError>;

    /// Produce raw changed text for the selected files.
    async fn generate_changes(
        &self,
        files: &OriginalFilesMap,
        selection: &SelectionMap,
        annotations: &AnnotationMap,
        plan: &str,
    ) -> Result<ChangedFilesMap, ApiError>;

    async fn fetch_precomputed_annotations(&self) -> Result<AnnotationMap, ApiError>;

    async fn fetch_precomputed_selection(&self) -> Result<SelectionMap, ApiError>;
}
