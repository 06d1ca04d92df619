//! HTTP completion client
//!
//! Both supported provider types accept `{prompt, max_tokens, temperature,
//! top_p}` and answer with `{"choices": [{"text": ...}]}`; they differ only in
//! the URL, the `model` field and authentication.

use crate::error::ApiError;
use crate::provider::profile::{ProviderConfig, ProviderType};
use crate::provider::{CompletionOptions, ModelProviderClient, PromptFormat};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    prompt: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

/// Pull `choices[0].text` out of a raw response body.
pub fn decode_completion(body: &[u8]) -> Result<String, ApiError> {
    let response: CompletionResponse = serde_json::from_slice(body)?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text)
        .ok_or_else(|| ApiError::InvalidResponse("completion has no choices".to_string()))
}

/// Completion client over reqwest
pub struct HttpProviderClient {
    http: reqwest::Client,
    url: String,
    model: String,
    provider_type: ProviderType,
    api_key: Option<String>,
    prompt_format: PromptFormat,
}

impl HttpProviderClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ApiError> {
        let endpoint = config.normalized_endpoint().ok_or_else(|| {
            ApiError::ProviderNotConfigured("provider endpoint is required".to_string())
        })?;
        let url = match config.provider_type {
            ProviderType::Invoke => format!("{}/model/{}/invoke", endpoint, config.model),
            ProviderType::OpenAI => format!("{}/completions", endpoint),
        };
        let api_key = config.resolved_api_key();
        if config.provider_type == ProviderType::OpenAI && api_key.is_none() {
            return Err(ApiError::ProviderNotConfigured(
                "OpenAI API key required (set in config or OPENAI_API_KEY env var)".to_string(),
            ));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url,
            model: config.model.clone(),
            provider_type: config.provider_type,
            api_key,
            prompt_format: config.prompt_format,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ModelProviderClient for HttpProviderClient {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, ApiError> {
        let prompt = self.prompt_format.wrap(prompt);
        let request = CompletionRequest {
            model: match self.provider_type {
                ProviderType::OpenAI => Some(self.model.as_str()),
                ProviderType::Invoke => None,
            },
            prompt: &prompt,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
        };

        let start = Instant::now();
        let mut builder = self.http.post(&self.url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::ProviderError(format!("status {}: {}", status, body)));
        }
        let body = response.bytes().await?;

        debug!(
            model = %self.model,
            status = %status,
            bytes = body.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Completion received"
        );
        decode_completion(&body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
