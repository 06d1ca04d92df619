//! Provider client construction

pub mod http;

use crate::error::ApiError;
use crate::provider::profile::ProviderConfig;
use crate::provider::ModelProviderClient;
use std::sync::Arc;

pub use http::HttpProviderClient;

/// Build the client for a provider configuration.
pub fn create_provider_client(
    config: &ProviderConfig,
) -> Result<Arc<dyn ModelProviderClient>, ApiError> {
    config.validate().map_err(ApiError::ConfigError)?;
    Ok(Arc::new(HttpProviderClient::new(config)?))
}
