//! Generation provider construction.
//!
//! [`create_provider`] builds a [`BoxLlmProvider`] from the `[llm]` config
//! section, and [`test_provider_connection`] sends a minimal request to check
//! that the key and endpoint work.

pub mod openai_compat;

use secrecy::SecretString;

use chatloom_core::llm::box_provider::BoxLlmProvider;
use chatloom_core::llm::provider::LlmProvider;
use chatloom_types::config::LlmSettings;
use chatloom_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, Message, ProviderCapabilities,
};

use self::openai_compat::OpenAiCompatibleProvider;

/// Read the API key from the environment variable named in `settings`.
pub fn resolve_api_key(settings: &LlmSettings) -> Option<SecretString> {
    std::env::var(&settings.api_key_env)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from)
}

/// Create a [`BoxLlmProvider`] from the `[llm]` settings.
///
/// An explicit `base_url` wins; otherwise the provider name selects one of
/// the well-known endpoints, falling back to OpenAI.
///
/// # Errors
///
/// `LlmError::AuthenticationFailed` if no API key is available.
pub fn create_provider(
    settings: &LlmSettings,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let key = api_key.ok_or(LlmError::AuthenticationFailed)?;

    let provider = match settings.base_url.as_deref() {
        Some(base_url) => OpenAiCompatibleProvider::new(openai_compat::config::custom(
            &settings.provider_name,
            base_url,
            key,
            &settings.model,
        )),
        None => match settings.provider_name.as_str() {
            "gemini" => OpenAiCompatibleProvider::gemini(key, &settings.model),
            "mistral" => OpenAiCompatibleProvider::mistral(key, &settings.model),
            _ => OpenAiCompatibleProvider::openai(key, &settings.model),
        },
    };

    Ok(BoxLlmProvider::new(provider))
}

/// Stand-in used when no API key is configured.
///
/// Every completion fails with `AuthenticationFailed`, so flows that never
/// call the provider (and read-only commands) keep working without a key.
pub struct UnconfiguredProvider {
    provider_name: String,
    capabilities: ProviderCapabilities,
}

impl UnconfiguredProvider {
    pub fn new(provider_name: &str) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            capabilities: ProviderCapabilities {
                max_context_tokens: 0,
                max_output_tokens: 0,
            },
        }
    }
}

impl LlmProvider for UnconfiguredProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Err(LlmError::AuthenticationFailed)
    }
}

/// Like [`create_provider`], but falls back to [`UnconfiguredProvider`] with
/// a warning when the key is missing.
pub fn create_provider_or_unconfigured(settings: &LlmSettings) -> BoxLlmProvider {
    match create_provider(settings, resolve_api_key(settings)) {
        Ok(provider) => provider,
        Err(err) => {
            tracing::warn!(
                provider = %settings.provider_name,
                env = %settings.api_key_env,
                "No usable API key ({err}); generation will fail until one is set"
            );
            BoxLlmProvider::new(UnconfiguredProvider::new(&settings.provider_name))
        }
    }
}

/// Send a tiny "Hello" completion to verify connectivity.
pub async fn test_provider_connection(provider: &BoxLlmProvider) -> Result<(), LlmError> {
    let request = CompletionRequest {
        // Provider uses its configured default
        model: String::new(),
        messages: vec![Message::human("Hello")],
        max_tokens: 10,
        temperature: Some(0.0),
    };
    provider.complete(&request).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> Option<SecretString> {
        Some(SecretString::from("sk-test".to_string()))
    }

    #[test]
    fn test_create_provider_by_name() {
        let settings = LlmSettings::default();
        assert_eq!(create_provider(&settings, key()).unwrap().name(), "openai");

        let settings = LlmSettings {
            provider_name: "mistral".to_string(),
            ..Default::default()
        };
        assert_eq!(create_provider(&settings, key()).unwrap().name(), "mistral");

        let settings = LlmSettings {
            provider_name: "gemini".to_string(),
            ..Default::default()
        };
        assert_eq!(create_provider(&settings, key()).unwrap().name(), "gemini");
    }

    #[test]
    fn test_create_provider_with_base_url() {
        let settings = LlmSettings {
            provider_name: "ollama".to_string(),
            base_url: Some("http://localhost:11434/v1".to_string()),
            model: "llama3".to_string(),
            ..Default::default()
        };
        let provider = create_provider(&settings, key()).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.capabilities().max_output_tokens, 4_096);
    }

    #[test]
    fn test_create_provider_unknown_name_falls_back_to_openai() {
        let settings = LlmSettings {
            provider_name: "something-else".to_string(),
            ..Default::default()
        };
        assert_eq!(create_provider(&settings, key()).unwrap().name(), "openai");
    }

    #[test]
    fn test_create_provider_missing_key() {
        let result = create_provider(&LlmSettings::default(), None);
        assert!(matches!(result, Err(LlmError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_fails_authentication() {
        let settings = LlmSettings {
            provider_name: "mistral".to_string(),
            api_key_env: "CHATLOOM_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        let provider = create_provider_or_unconfigured(&settings);
        assert_eq!(provider.name(), "mistral");

        let result = test_provider_connection(&provider).await;
        assert!(matches!(result, Err(LlmError::AuthenticationFailed)));
    }

    #[test]
    fn test_resolve_api_key_missing_variable() {
        let settings = LlmSettings {
            api_key_env: "CHATLOOM_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert!(resolve_api_key(&settings).is_none());
    }
}
