//! LlmProvider trait definition.
//!
//! This is the core abstraction that all generation providers implement.
//! Uses RPITIT for `complete`; `BoxLlmProvider` adds dynamic dispatch.

use chatloom_types::llm::{CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities};

/// Trait for generation provider backends (OpenAI, Mistral, etc.).
///
/// Implementations live in chatloom-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Context and output limits of this provider.
    fn capabilities(&self) -> &ProviderCapabilities;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
