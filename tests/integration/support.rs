//! In-process fakes for the provider and backend seams.

use async_trait::async_trait;
use codeplan::backend::{PipelineBackend, SelectionResponse};
use codeplan::error::ApiError;
use codeplan::progress::{ProgressSink, Stage};
use codeplan::provider::{CompletionOptions, ModelProviderClient};
use codeplan::types::{AnnotationMap, ChangedFilesMap, OriginalFilesMap, SelectionMap};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Duration;

/// Provider that answers `summary of <path>` and fails for listed paths.
///
/// Responses for paths listed in `delays` are held back, so completion order
/// differs from request order.
#[derive(Default)]
pub struct FakeProvider {
    pub failing: Vec<String>,
    pub delays: BTreeMap<String, Duration>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn failing(paths: &[&str]) -> Self {
        Self {
            failing: paths.iter().map(|p| p.to_string()).collect(),
            ..Self::default()
        }
    }

    fn path_in(prompt: &str) -> Option<String> {
        prompt
            .lines()
            .find_map(|line| line.strip_prefix("Path: "))
            .map(str::to_string)
    }
}

#[async_trait]
impl ModelProviderClient for FakeProvider {
    async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<String, ApiError> {
        self.prompts.lock().push(prompt.to_string());
        let path = Self::path_in(prompt).unwrap_or_default();
        if let Some(delay) = self.delays.get(&path) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&path) {
            return Err(ApiError::ProviderRequestFailed(format!(
                "connection reset for {}",
                path
            )));
        }
        Ok(format!("\n  summary of {}  \n", path))
    }

    fn model(&self) -> &str {
        "fake"
    }
}

/// Backend with canned answers that records what it was sent.
pub struct FakeBackend {
    pub analysis: Result<String, String>,
    pub selection: Result<SelectionResponse, String>,
    pub changes: Result<ChangedFilesMap, String>,
    pub precomputed: Option<(AnnotationMap, SelectionMap)>,
    pub saved: Mutex<Vec<AnnotationMap>>,
    pub generate_requests: Mutex<Vec<(OriginalFilesMap, SelectionMap, String)>>,
    pub select_calls: Mutex<usize>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            analysis: Ok("1. Change proj/a.py".to_string()),
            selection: Ok(selection_response("success", &[("proj/a.py", "prints")])),
            changes: Ok(ChangedFilesMap::new()),
            precomputed: None,
            saved: Mutex::new(Vec::new()),
            generate_requests: Mutex::new(Vec::new()),
            select_calls: Mutex::new(0),
        }
    }
}

pub fn selection_response(status: &str, entries: &[(&str, &str)]) -> SelectionResponse {
    serde_json::from_value(serde_json::json!({
        "status": status,
        "top_r_docstrings": entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
    }))
    .unwrap()
}

#[async_trait]
impl PipelineBackend for FakeBackend {
    async fn analyze_feature(&self, _description: &str) -> Result<String, ApiError> {
        self.analysis.clone().map_err(ApiError::ProviderError)
    }

    async fn save_annotations(&self, annotations: &AnnotationMap) -> Result<(), ApiError> {
        self.saved.lock().push(annotations.clone());
        Err(ApiError::ProviderRequestFailed("save endpoint offline".to_string()))
    }

    async fn select_files(
        &self,
        _plan: &str,
        _annotations: &AnnotationMap,
    ) -> Result<SelectionResponse, ApiError> {
        *self.select_calls.lock() += 1;
        self.selection.clone().map_err(ApiError::ProviderError)
    }

    async fn generate_changes(
        &self,
        files: &OriginalFilesMap,
        selection: &SelectionMap,
        _annotations: &AnnotationMap,
        plan: &str,
    ) -> Result<ChangedFilesMap, ApiError> {
        self.generate_requests
            .lock()
            .push((files.clone(), selection.clone(), plan.to_string()));
        self.changes.clone().map_err(ApiError::InvalidResponse)
    }

    async fn fetch_precomputed_annotations(&self) -> Result<AnnotationMap, ApiError> {
        self.precomputed
            .as_ref()
            .map(|(a, _)| a.clone())
            .ok_or_else(|| ApiError::NotFound("docstrings.json".to_string()))
    }

    async fn fetch_precomputed_selection(&self) -> Result<SelectionMap, ApiError> {
        self.precomputed
            .as_ref()
            .map(|(_, s)| s.clone())
            .ok_or_else(|| ApiError::NotFound("topR.json".to_string()))
    }
}

/// Progress sink that keeps every report.
#[derive(Default)]
pub struct RecordingProgress {
    pub reports: Mutex<Vec<(Stage, u8)>>,
}

impl RecordingProgress {
    pub fn values(&self, stage: Stage) -> Vec<u8> {
        self.reports
            .lock()
            .iter()
            .filter(|(s, _)| *s == stage)
            .map(|(_, p)| *p)
            .collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, stage: Stage, percent: u8) {
        self.reports.lock().push((stage, percent));
    }
}

pub fn assert_non_decreasing(values: &[u8]) {
    assert!(
        values.windows(2).all(|w| w[0] <= w[1]),
        "progress went backwards: {:?}",
        values
    );
}
