//! Configuration
//!
//! Layered configuration: built-in defaults, then the global file, then the
//! workspace file, then `CODEPLAN_*` environment variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;

use crate::backend::BackendConfig;
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::provider::ProviderConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeplanConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub annotation: AnnotationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CodeplanConfig {
    pub fn validate(&self) -> Result<(), ApiError> {
        self.backend.validate().map_err(ApiError::ConfigError)?;
        self.provider.validate().map_err(ApiError::ConfigError)?;
        self.ingest.validate().map_err(ApiError::ConfigError)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}

/// Which files are ingested and how their code is fenced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// File extensions kept by the directory scan, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Language name used in prompts and as the code fence tag
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_extensions() -> Vec<String> {
    vec!["py".to_string()]
}

fn default_language() -> String {
    "python".to_string()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            language: default_language(),
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.extensions.iter().all(|ext| ext.trim().is_empty()) {
            return Err("ingest.extensions must list at least one extension".to_string());
        }
        if self.language.trim().is_empty() {
            return Err("ingest.language must not be empty".to_string());
        }
        Ok(())
    }
}

/// Annotation prompt settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationConfig {
    /// Prompt template file; relative paths resolve against the prompts dir
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_file: Option<String>,
}
