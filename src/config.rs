//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Runtime configuration for the tool server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Generative backend, if an API key was provided.
    pub llm: Option<LlmConfig>,
    /// Path to the libsql event store (`:memory:` for an ephemeral store).
    pub db_path: PathBuf,
    /// Budget for a single completion call.
    pub llm_timeout: Duration,
    /// Budget for a whole tool handler, enforced by the dispatcher.
    pub tool_timeout: Duration,
    /// Port for the HTTP transport. `None` runs the stdio server.
    pub http_port: Option<u16>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: None,
            db_path: PathBuf::from(":memory:"),
            llm_timeout: Duration::from_secs(20),
            tool_timeout: Duration::from_secs(45),
            http_port: None,
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables.
    ///
    /// - `ANTHROPIC_API_KEY` / `OPENAI_API_KEY`: provider credentials
    /// - `WELLNESS_LLM_BACKEND`: `anthropic` or `openai` when both keys are set
    /// - `WELLNESS_MODEL`: model override
    /// - `WELLNESS_DB_PATH`: event store path (default `./data/wellness.db`)
    /// - `WELLNESS_LLM_TIMEOUT_SECS`: completion budget (default 20)
    /// - `WELLNESS_TOOL_TIMEOUT_SECS`: handler budget (default 45)
    /// - `WELLNESS_HTTP_PORT`: serve over HTTP instead of stdio
    pub fn from_env() -> Result<Self, ConfigError> {
        let llm = llm_config_from_env()?;

        let db_path = std::env::var("WELLNESS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/wellness.db"));

        let llm_timeout = Duration::from_secs(parse_secs("WELLNESS_LLM_TIMEOUT_SECS", 20)?);
        let tool_timeout = Duration::from_secs(parse_secs("WELLNESS_TOOL_TIMEOUT_SECS", 45)?);

        let http_port = match std::env::var("WELLNESS_HTTP_PORT") {
            Ok(raw) => Some(raw.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
                key: "WELLNESS_HTTP_PORT".to_string(),
                message: e.to_string(),
            })?),
            Err(_) => None,
        };

        Ok(Self {
            llm,
            db_path,
            llm_timeout,
            tool_timeout,
            http_port,
        })
    }
}

fn llm_config_from_env() -> Result<Option<LlmConfig>, ConfigError> {
    let anthropic = std::env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty());
    let openai = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());

    let backend = match std::env::var("WELLNESS_LLM_BACKEND") {
        Ok(raw) => Some(parse_backend(&raw)?),
        Err(_) => None,
    };

    let (backend, key) = match (backend, anthropic, openai) {
        (Some(LlmBackend::Anthropic), Some(key), _) => (LlmBackend::Anthropic, key),
        (Some(LlmBackend::OpenAi), _, Some(key)) => (LlmBackend::OpenAi, key),
        (Some(LlmBackend::Anthropic), None, _) => {
            return Err(ConfigError::MissingEnvVar("ANTHROPIC_API_KEY".to_string()));
        }
        (Some(LlmBackend::OpenAi), _, None) => {
            return Err(ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()));
        }
        (None, Some(key), _) => (LlmBackend::Anthropic, key),
        (None, None, Some(key)) => (LlmBackend::OpenAi, key),
        (None, None, None) => return Ok(None),
    };

    let model = std::env::var("WELLNESS_MODEL").unwrap_or_else(|_| {
        match backend {
            LlmBackend::Anthropic => DEFAULT_ANTHROPIC_MODEL,
            LlmBackend::OpenAi => DEFAULT_OPENAI_MODEL,
        }
        .to_string()
    });

    Ok(Some(LlmConfig {
        backend,
        api_key: SecretString::from(key),
        model,
    }))
}

fn parse_backend(raw: &str) -> Result<LlmBackend, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "anthropic" => Ok(LlmBackend::Anthropic),
        "openai" => Ok(LlmBackend::OpenAi),
        other => Err(ConfigError::InvalidValue {
            key: "WELLNESS_LLM_BACKEND".to_string(),
            message: format!("unknown backend '{other}'"),
        }),
    }
}

fn parse_secs(key: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}
