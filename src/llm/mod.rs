//! The generative collaborator behind crisis classification, artifact
//! synthesis, and the coaching tools.
//!
//! Anthropic or OpenAI is reached through rig-core (see `RigAdapter`). With
//! no API key configured the dispatcher gets `UnavailableLlm`, and every
//! generative tool answers from its static fallback instead.

pub mod provider;
mod rig_adapter;

pub use provider::*;
pub use rig_adapter::RigAdapter;

use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::error::LlmError;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.backend {
        LlmBackend::Anthropic => create_anthropic_provider(config),
        LlmBackend::OpenAi => create_openai_provider(config),
    }
}

fn create_anthropic_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::anthropic;

    let client: rig::client::Client<anthropic::client::AnthropicExt> =
        anthropic::Client::new(config.api_key.expose_secret())
            .map_err(|e| client_error("anthropic", e))?;

    let model = client.completion_model(&config.model);
    tracing::info!(model = %config.model, "Generative collaborator: Anthropic");
    Ok(Arc::new(RigAdapter::new(model, &config.model)))
}

fn create_openai_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::openai;

    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        openai::Client::new(config.api_key.expose_secret()).map_err(|e| client_error("openai", e))?;

    let model = client.completion_model(&config.model);
    tracing::info!(model = %config.model, "Generative collaborator: OpenAI");
    Ok(Arc::new(RigAdapter::new(model, &config.model)))
}

fn client_error(provider: &str, err: impl std::fmt::Display) -> LlmError {
    LlmError::RequestFailed {
        provider: provider.to_string(),
        reason: format!("client setup failed: {err}"),
    }
}

/// Provider used when no API key is configured: every call fails, so
/// generative tools take their degraded path.
pub struct UnavailableLlm;

#[async_trait::async_trait]
impl LlmProvider for UnavailableLlm {
    fn model_name(&self) -> &str {
        "unavailable"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Err(LlmError::RequestFailed {
            provider: "unavailable".to_string(),
            reason: "no LLM backend configured".to_string(),
        })
    }
}
