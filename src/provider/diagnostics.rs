use crate::provider::profile::{provider_type_slug, ProviderConfig, ProviderType, ValidationResult};

pub struct ProviderDiagnosticsService;

impl ProviderDiagnosticsService {
    pub fn resolve_api_key_status(provider: &ProviderConfig) -> String {
        let env_var = match provider.provider_type {
            ProviderType::OpenAI => "OPENAI_API_KEY",
            ProviderType::Invoke => "CODEPLAN_INVOKE_API_KEY",
        };
        if provider.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()) {
            "Set (from config)".to_string()
        } else if std::env::var(env_var).is_ok() {
            "Set (from environment)".to_string()
        } else {
            "Not set".to_string()
        }
    }

    /// Run every configuration check and collect the outcome.
    pub fn validate(provider: &ProviderConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        let config_ok = match provider.validate() {
            Ok(()) => true,
            Err(e) => {
                result.add_error(e);
                false
            }
        };
        result.add_check(
            &format!(
                "{} provider configuration is well-formed",
                provider_type_slug(provider.provider_type)
            ),
            config_ok,
        );

        let has_key = provider.resolved_api_key().is_some();
        match provider.provider_type {
            ProviderType::OpenAI => {
                result.add_check("API key available", has_key);
                if !has_key {
                    result.add_error(
                        "OpenAI API key required (set in config or OPENAI_API_KEY env var)"
                            .to_string(),
                    );
                }
            }
            ProviderType::Invoke => {
                if !has_key {
                    result.add_warning(
                        "No API key configured; requests are sent unauthenticated".to_string(),
                    );
                }
            }
        }

        if let Some(endpoint) = &provider.endpoint {
            if endpoint.trim().starts_with("http://")
                && !endpoint.contains("localhost")
                && !endpoint.contains("127.0.0.1")
            {
                result.add_warning(format!("Endpoint {} is not using https", endpoint));
            }
        }

        result
    }
}
