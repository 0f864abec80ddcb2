//! Invocation context: per-call metadata handed to tool handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Context for a single tool invocation.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationContext {
    /// Unique invocation ID, used to correlate log lines.
    pub invocation_id: Uuid,
    /// Tool being invoked.
    pub tool: String,
    /// When the dispatcher accepted the call.
    pub started_at: DateTime<Utc>,
}

impl InvocationContext {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            tool: tool.into(),
            started_at: Utc::now(),
        }
    }

    /// Milliseconds since the call was accepted.
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}

impl Default for InvocationContext {
    fn default() -> Self {
        Self::new("unknown")
    }
}
