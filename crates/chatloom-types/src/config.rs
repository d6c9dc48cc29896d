//! Global configuration types for Chatloom.
//!
//! `AppConfig` represents the top-level `config.toml` that controls the
//! default user identity, the checkpoint backend, and generation settings.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
///
/// Loaded from `~/.chatloom/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User id used when a caller does not name one.
    #[serde(default = "default_user_id")]
    pub default_user_id: String,

    /// Display name for the default user.
    #[serde(default = "default_user_name")]
    pub default_user_name: String,

    /// Where conversation checkpoints are kept.
    #[serde(default)]
    pub checkpoint_backend: CheckpointBackend,

    /// Generation provider settings.
    #[serde(default)]
    pub llm: LlmSettings,
}

fn default_user_id() -> String {
    "10001".to_string()
}

fn default_user_name() -> String {
    "default".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_user_id: default_user_id(),
            default_user_name: default_user_name(),
            checkpoint_backend: CheckpointBackend::default(),
            llm: LlmSettings::default(),
        }
    }
}

/// Storage backend for conversation checkpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointBackend {
    /// Durable SQLite table next to the metadata store.
    #[default]
    Sqlite,
    /// Process-local; lost on exit.
    Memory,
}

/// Settings for the OpenAI-compatible generation provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Human-readable provider name (e.g., "openai", "mistral").
    #[serde(default = "default_provider_name")]
    pub provider_name: String,
    /// Override the provider's default base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Upper bound on a single generation call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_provider_name() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider_name: default_provider_name(),
            base_url: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
        }
    }
}
