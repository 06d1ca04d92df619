//! Model Providers
//!
//! Text-completion clients for the model invocation service. Annotation goes
//! through this seam; everything behind it is an external collaborator whose
//! request/response contract is all the core relies on.

pub mod clients;
pub mod diagnostics;
pub mod profile;
pub mod prompt;

use crate::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use clients::{create_provider_client, HttpProviderClient};
pub use profile::{ProviderConfig, ProviderType};
pub use prompt::PromptFormat;

/// Sampling options sent with each completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

fn default_max_tokens() -> u32 {
    2048
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: Some(0.5),
            top_p: None,
        }
    }
}

/// Client for a text-completion model
#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    /// Complete `prompt` and return the generated text as-is.
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, ApiError>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}
