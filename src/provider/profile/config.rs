use crate::provider::{CompletionOptions, PromptFormat};
use serde::{Deserialize, Serialize};

/// Model provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type.
    #[serde(default)]
    pub provider_type: ProviderType,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// API key optional and can be loaded from environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the model invocation service.
    #[serde(default = "default_endpoint", skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Instruction format wrapped around every prompt.
    #[serde(default)]
    pub prompt_format: PromptFormat,

    /// Request timeout in seconds; unset leaves the transport default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Default completion options for this provider.
    #[serde(default)]
    pub default_options: CompletionOptions,
}

fn default_model() -> String {
    "us.deepseek.r1-v1:0".to_string()
}

fn default_endpoint() -> Option<String> {
    Some("http://localhost:8080".to_string())
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::default(),
            model: default_model(),
            api_key: None,
            endpoint: default_endpoint(),
            prompt_format: PromptFormat::default(),
            timeout_secs: None,
            default_options: CompletionOptions::default(),
        }
    }
}

/// Provider type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Model invocation service: `POST {endpoint}/model/{model}/invoke`
    #[default]
    Invoke,
    /// OpenAI-compatible text completions: `POST {endpoint}/completions`
    #[serde(rename = "openai")]
    OpenAI,
}

impl ProviderConfig {
    fn endpoint_has_scheme(endpoint: &str) -> bool {
        endpoint.starts_with("http://") || endpoint.starts_with("https://")
    }

    /// Endpoint with an `https://` scheme inferred when missing and no
    /// trailing slash.
    pub fn normalized_endpoint(&self) -> Option<String> {
        self.endpoint.as_deref().map(|endpoint| {
            let endpoint = endpoint.trim().trim_end_matches('/');
            if Self::endpoint_has_scheme(endpoint) {
                endpoint.to_string()
            } else {
                format!("https://{}", endpoint)
            }
        })
    }

    pub fn endpoint_url_is_valid(endpoint: &str) -> bool {
        let endpoint = endpoint.trim();
        let rest = endpoint
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(endpoint);

        if rest.is_empty() || rest.chars().any(char::is_whitespace) {
            return false;
        }

        let authority = rest.split('/').next().unwrap_or_default();
        let host_port = authority.rsplit('@').next().unwrap_or(authority);
        let host = if host_port.starts_with('[') {
            let Some(end_bracket) = host_port.find(']') else {
                return false;
            };
            &host_port[1..end_bracket]
        } else {
            host_port.split(':').next().unwrap_or_default()
        };

        if host.is_empty() {
            return false;
        }

        host == "localhost" || host.contains('.') || host.parse::<std::net::IpAddr>().is_ok()
    }

    /// API key from config, falling back to the provider's environment variable.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| match self.provider_type {
                ProviderType::OpenAI => std::env::var("OPENAI_API_KEY").ok(),
                ProviderType::Invoke => std::env::var("CODEPLAN_INVOKE_API_KEY").ok(),
            })
    }

    /// Validate provider configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }

        match &self.endpoint {
            Some(endpoint) if !Self::endpoint_url_is_valid(endpoint) => {
                return Err(format!("Invalid endpoint URL: {}", endpoint));
            }
            None => return Err("Provider endpoint is required".to_string()),
            _ => {}
        }

        if let Some(temp) = self.default_options.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(format!(
                    "Temperature must be between 0.0 and 2.0, got {}",
                    temp
                ));
            }
        }

        if let Some(top_p) = self.default_options.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(format!("top_p must be between 0.0 and 1.0, got {}", top_p));
            }
        }

        if self.default_options.max_tokens == 0 {
            return Err("max_tokens must be greater than zero".to_string());
        }

        Ok(())
    }
}
