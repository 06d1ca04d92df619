//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::CodeplanConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from files and environment.
    pub fn load(workspace_root: &Path) -> Result<CodeplanConfig, ApiError> {
        Ok(MergeService::load(workspace_root)?)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<CodeplanConfig, ApiError> {
        if !path.exists() {
            return Err(ApiError::NotFound(format!(
                "config file {}",
                path.display()
            )));
        }
        Ok(MergeService::load_from_file(path)?)
    }

    /// Create default configuration.
    pub fn default() -> CodeplanConfig {
        CodeplanConfig::default()
    }
}
