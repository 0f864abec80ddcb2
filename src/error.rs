//! Error types for the wellness tool core.

use std::time::Duration;

use serde::Serialize;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Invalid trigger rule: {0}")]
    Routing(#[from] regex::Error),

    #[error("Invalid flow definition: {0}")]
    InvalidFlow(String),
}

/// Coarse error classification.
///
/// `CollaboratorUnavailable` and `PersistenceFailure` are absorbed into
/// degraded results and only appear in logs; the others reach envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownTool,
    InvalidArgument,
    InvalidChoice,
    SessionComplete,
    CollaboratorUnavailable,
    PersistenceFailure,
    ExecutionFailed,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::UnknownTool => "unknown_tool",
            Self::InvalidArgument => "invalid_argument",
            Self::InvalidChoice => "invalid_choice",
            Self::SessionComplete => "session_complete",
            Self::CollaboratorUnavailable => "collaborator_unavailable",
            Self::PersistenceFailure => "persistence_failure",
            Self::ExecutionFailed => "execution_failed",
        };
        write!(f, "{s}")
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Session state machine errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("Choice '{choice}' is not an option at stage {stage}")]
    InvalidChoice { stage: String, choice: String },

    #[error("Invalid input for stage {stage}: {reason}")]
    InvalidInput { stage: String, reason: String },

    #[error("Session for flow {flow} is already complete")]
    SessionComplete { flow: String },

    #[error("Unknown stage '{stage}' in flow {flow}")]
    UnknownStage { flow: String, stage: String },

    #[error("Stage '{stage}' submitted out of order in flow {flow}, expected '{expected}'")]
    OutOfOrder {
        flow: String,
        stage: String,
        expected: String,
    },
}

impl FlowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidChoice { .. } => ErrorKind::InvalidChoice,
            Self::SessionComplete { .. } => ErrorKind::SessionComplete,
            Self::InvalidInput { .. } | Self::UnknownStage { .. } | Self::OutOfOrder { .. } => {
                ErrorKind::InvalidArgument
            }
        }
    }
}

/// Tool dispatch and execution errors.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool {name} not found")]
    UnknownTool { name: String },

    #[error("Invalid arguments for tool {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Tool {name}: {source}")]
    Flow {
        name: String,
        #[source]
        source: FlowError,
    },

    #[error("Tool {name} timed out after {timeout:?}")]
    Timeout { name: String, timeout: Duration },

    #[error("Tool {name} execution failed: {reason}")]
    ExecutionFailed { name: String, reason: String },
}

impl ToolError {
    /// Envelope classification for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTool { .. } => ErrorKind::UnknownTool,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::Flow { source, .. } => source.kind(),
            Self::Timeout { .. } | Self::ExecutionFailed { .. } => ErrorKind::ExecutionFailed,
        }
    }

    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_errors_map_to_envelope_kinds() {
        let choice = FlowError::InvalidChoice {
            stage: "scenario_1".into(),
            choice: "approach_c".into(),
        };
        assert_eq!(choice.kind(), ErrorKind::InvalidChoice);

        let done = FlowError::SessionComplete {
            flow: "walk_a_mile".into(),
        };
        assert_eq!(done.kind(), ErrorKind::SessionComplete);

        let order = FlowError::OutOfOrder {
            flow: "walk_a_mile".into(),
            stage: "scenario_3".into(),
            expected: "scenario_1".into(),
        };
        assert_eq!(order.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn tool_flow_error_keeps_inner_kind() {
        let err = ToolError::Flow {
            name: "walk_a_mile".into(),
            source: FlowError::SessionComplete {
                flow: "walk_a_mile".into(),
            },
        };
        assert_eq!(err.kind(), ErrorKind::SessionComplete);
        assert!(err.to_string().contains("already complete"));
    }

    #[test]
    fn error_kind_display_matches_serde() {
        for kind in [
            ErrorKind::UnknownTool,
            ErrorKind::InvalidArgument,
            ErrorKind::InvalidChoice,
            ErrorKind::SessionComplete,
            ErrorKind::CollaboratorUnavailable,
            ErrorKind::PersistenceFailure,
            ErrorKind::ExecutionFailed,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
