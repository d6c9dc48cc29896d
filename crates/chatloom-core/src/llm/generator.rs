//! Response generation over a conversation.
//!
//! `ResponseGenerator` is the only place a flow talks to the provider. It
//! turns an ordered message list plus an optional system instruction into a
//! single reply. The system instruction is placed first in the outgoing
//! request; the caller's messages are never modified. Provider errors are
//! returned unchanged; a call that outlives the configured timeout fails with
//! `LlmError::Timeout`.

use std::time::Duration;

use chatloom_types::config::LlmSettings;
use chatloom_types::llm::{CompletionRequest, LlmError, Message};
use tracing::{debug, warn};

use super::box_provider::BoxLlmProvider;

/// Model parameters for every request the generator sends.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub model: String,
    pub temperature: Option<f64>,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: Some(0.7),
            max_tokens: 1024,
            timeout: Duration::from_secs(60),
        }
    }
}

impl From<&LlmSettings> for GeneratorSettings {
    fn from(settings: &LlmSettings) -> Self {
        Self {
            model: settings.model.clone(),
            temperature: Some(settings.temperature),
            max_tokens: settings.max_tokens,
            timeout: Duration::from_secs(settings.timeout_secs.max(1)),
        }
    }
}

/// Stateless mapping from a message list to one generated reply.
pub struct ResponseGenerator {
    provider: BoxLlmProvider,
    settings: GeneratorSettings,
}

impl ResponseGenerator {
    pub fn new(provider: BoxLlmProvider, settings: GeneratorSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider(&self) -> &BoxLlmProvider {
        &self.provider
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Build the outgoing request: system instruction first, then `messages`.
    /// `max_tokens` never exceeds a known provider output limit.
    pub fn build_request(&self, messages: &[Message], system_prompt: Option<&str>) -> CompletionRequest {
        let mut outgoing = Vec::with_capacity(messages.len() + 1);
        if let Some(system) = system_prompt {
            outgoing.push(Message::system(system));
        }
        outgoing.extend_from_slice(messages);

        let limit = self.provider.capabilities().max_output_tokens;
        let max_tokens = match limit {
            0 => self.settings.max_tokens,
            limit => self.settings.max_tokens.min(limit),
        };

        CompletionRequest {
            model: self.settings.model.clone(),
            messages: outgoing,
            max_tokens,
            temperature: self.settings.temperature,
        }
    }

    /// Generate one reply for the conversation so far.
    #[tracing::instrument(
        name = "chat",
        skip_all,
        fields(
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = %self.provider.name(),
            gen_ai.request.model = %self.settings.model,
            message_count = messages.len(),
        )
    )]
    pub async fn generate(
        &self,
        messages: &[Message],
        system_prompt: Option<&str>,
    ) -> Result<String, LlmError> {
        let request = self.build_request(messages, system_prompt);

        let response =
            match tokio::time::timeout(self.settings.timeout, self.provider.complete(&request)).await
            {
                Ok(result) => result?,
                Err(_) => {
                    let after_ms = self.settings.timeout.as_millis() as u64;
                    warn!(after_ms, "Generation call timed out");
                    return Err(LlmError::Timeout { after_ms });
                }
            };

        debug!(
            gen_ai.response.id = %response.id,
            gen_ai.usage.input_tokens = response.usage.input_tokens,
            gen_ai.usage.output_tokens = response.usage.output_tokens,
            stop_reason = %response.stop_reason,
            "Generation complete"
        );

        Ok(response.content)
    }
}
