//! reqwest implementation of [`PipelineBackend`].

use super::wire::{
    AnalyzeRequest, AnalyzeResponse, GenerateRequest, GenerateResponse, SelectRequest,
    SelectionResponse,
};
use super::{BackendConfig, PipelineBackend};
use crate::error::ApiError;
use crate::types::{AnnotationMap, ChangedFilesMap, OriginalFilesMap, SelectionMap};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

pub struct HttpBackend {
    http: reqwest::Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self, ApiError> {
        config.validate().map_err(ApiError::ConfigError)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn url(&self, path: &str) -> String {
        let base = self.config.base_url.trim().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        let start = Instant::now();
        let response = self.http.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::ProviderError(format!("{} returned {}: {}", url, status, text)));
        }
        let bytes = response.bytes().await?;
        debug!(
            url = %url,
            status = %status,
            bytes = bytes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Backend call completed"
        );
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let url = self.url(path);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::ProviderError(format!("{} returned {}", url, status)));
        }
        let bytes = response.bytes().await?;
        debug!(url = %url, bytes = bytes.len(), "Fetched artifact");
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl PipelineBackend for HttpBackend {
    async fn analyze_feature(&self, description: &str) -> Result<String, ApiError> {
        let response: AnalyzeResponse = self
            .post(
                &self.config.paths.analyze,
                &AnalyzeRequest {
                    feature_description: description,
                },
            )
            .await?;
        Ok(response.analysis)
    }

    async fn save_annotations(&self, annotations: &AnnotationMap) -> Result<(), ApiError> {
        // The body is the bare map.
        let _: serde_json::Value = self
            .post(&self.config.paths.save_annotations, annotations)
            .await?;
        Ok(())
    }

    async fn select_files(
        &self,
        plan: &str,
        annotations: &AnnotationMap,
    ) -> Result<SelectionResponse, ApiError> {
        self.post(
            &self.config.paths.select,
            &SelectRequest {
                low_level_plan: plan,
                docstring_results: annotations,
            },
        )
        .await
    }

    async fn generate_changes(
        &self,
        files: &OriginalFilesMap,
        selection: &SelectionMap,
        annotations: &AnnotationMap,
        plan: &str,
    ) -> Result<ChangedFilesMap, ApiError> {
        let response: GenerateResponse = self
            .post(
                &self.config.paths.generate,
                &GenerateRequest {
                    files,
                    top_r: selection,
                    docstrings: annotations,
                    low_level_plan: plan,
                },
            )
            .await?;
        Ok(response.changed_files)
    }

    async fn fetch_precomputed_annotations(&self) -> Result<AnnotationMap, ApiError> {
        self.get(&self.config.paths.precomputed_annotations).await
    }

    async fn fetch_precomputed_selection(&self) -> Result<SelectionMap, ApiError> {
        self.get(&self.config.paths.precomputed_selection).await
    }
}
