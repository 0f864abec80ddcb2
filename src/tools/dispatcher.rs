//! Tool invocation dispatcher.
//!
//! Looks a tool up by name, checks its arguments against the tool's schema,
//! runs the handler under a time budget, and wraps the outcome in the
//! response envelope. Holds no per-call state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::context::InvocationContext;
use crate::error::{ErrorKind, ToolError};
use crate::tools::registry::ToolRegistry;

/// One request as it arrives on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolRequest {
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Routes calls to registered tools.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Invoke `name` with `arguments`. On success the result carries a
    /// `timestamp`.
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let Some(entry) = self.registry.lookup(name).await else {
            warn!(tool = %name, kind = %ErrorKind::UnknownTool, "Unknown tool requested");
            return Err(ToolError::UnknownTool {
                name: name.to_string(),
            });
        };

        let arguments = if arguments.is_null() {
            json!({})
        } else {
            arguments
        };
        let check = entry.validator.check(&arguments);
        if !check.is_valid {
            let err = ToolError::invalid(name, check.summary());
            warn!(tool = %name, kind = %err.kind(), error = %err, "Rejected tool arguments");
            return Err(err);
        }

        let ctx = InvocationContext::new(name);
        info!(tool = %name, invocation_id = %ctx.invocation_id, "Dispatching tool");

        let tool = entry.tool;
        let task_ctx = ctx.clone();
        let handle = tokio::spawn(async move { tool.execute(arguments, &task_ctx).await });
        let abort = handle.abort_handle();

        let outcome = match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(ToolError::ExecutionFailed {
                name: name.to_string(),
                reason: if join_err.is_panic() {
                    "handler panicked".to_string()
                } else {
                    "handler was cancelled".to_string()
                },
            }),
            Err(_) => {
                abort.abort();
                Err(ToolError::Timeout {
                    name: name.to_string(),
                    timeout: self.timeout,
                })
            }
        };

        match outcome {
            Ok(output) => {
                info!(
                    tool = %name,
                    invocation_id = %ctx.invocation_id,
                    duration_ms = output.duration.as_millis() as u64,
                    "Tool completed"
                );
                Ok(stamp(output.result))
            }
            Err(err) => {
                if err.kind() == ErrorKind::ExecutionFailed {
                    error!(
                        tool = %name,
                        invocation_id = %ctx.invocation_id,
                        elapsed_ms = ctx.elapsed_ms(),
                        error = %err,
                        "Tool failed"
                    );
                } else {
                    warn!(
                        tool = %name,
                        invocation_id = %ctx.invocation_id,
                        kind = %err.kind(),
                        error = %err,
                        "Tool rejected call"
                    );
                }
                Err(err)
            }
        }
    }

    /// Invoke and always produce an envelope: the stamped result, or the
    /// normalized failure object.
    pub async fn handle(&self, request: ToolRequest) -> Value {
        match self.invoke(&request.tool, request.arguments).await {
            Ok(result) => result,
            Err(err) => failure_envelope(&request.tool, &err),
        }
    }
}

/// `{error, tool, status: "failed", kind, timestamp}`.
pub fn failure_envelope(tool: &str, err: &ToolError) -> Value {
    json!({
        "error": err.to_string(),
        "tool": tool,
        "status": "failed",
        "kind": err.kind(),
        "timestamp": Utc::now().to_rfc3339(),
    })
}

/// Add a `timestamp` to a result; non-object results are wrapped.
fn stamp(result: Value) -> Value {
    let now = Value::String(Utc::now().to_rfc3339());
    match result {
        Value::Object(mut map) => {
            map.entry("timestamp").or_insert(now);
            Value::Object(map)
        }
        other => json!({ "result": other, "timestamp": now }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use async_trait::async_trait;

    use crate::tools::tool::{Tool, ToolOutput};

    struct EchoTool {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echo the message back"
        }
        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {
                    "message": {"type": "string"},
                    "repeat": {"type": "integer", "minimum": 1},
                    "tags": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["message"]
            })
        }
        async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
            let start = Instant::now();
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutput::success(
                json!({"echo": params["message"]}),
                start.elapsed(),
            ))
        }
    }

    struct StallTool;

    #[async_trait]
    impl Tool for StallTool {
        fn name(&self) -> &str {
            "stall"
        }
        fn description(&self) -> &str {
            "Never finishes in time"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }
        async fn execute(&self, _params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(ToolOutput::success(json!({}), Duration::ZERO))
        }
    }

    struct PanicTool;

    #[async_trait]
    impl Tool for PanicTool {
        fn name(&self) -> &str {
            "panic"
        }
        fn description(&self) -> &str {
            "Panics"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }
        async fn execute(&self, _params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
            panic!("handler bug");
        }
    }

    struct ScalarTool;

    #[async_trait]
    impl Tool for ScalarTool {
        fn name(&self) -> &str {
            "scalar"
        }
        fn description(&self) -> &str {
            "Returns a bare number"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }
        async fn execute(&self, _params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::success(json!(42), Duration::ZERO))
        }
    }

    fn dispatcher() -> (Dispatcher, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = ToolRegistry::new();
        registry.register_sync(Arc::new(EchoTool {
            calls: calls.clone(),
        }));
        registry.register_sync(Arc::new(StallTool));
        registry.register_sync(Arc::new(PanicTool));
        registry.register_sync(Arc::new(ScalarTool));
        (
            Dispatcher::new(Arc::new(registry), Duration::from_millis(100)),
            calls,
        )
    }

    #[tokio::test]
    async fn success_is_stamped() {
        let (dispatcher, calls) = dispatcher();
        let result = dispatcher
            .invoke("echo", json!({"message": "hi"}))
            .await
            .unwrap();
        assert_eq!(result["echo"], "hi");
        assert!(result["timestamp"].is_string());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_tool_runs_nothing() {
        let (dispatcher, calls) = dispatcher();
        let err = dispatcher.invoke("Echo", json!({"message": "hi"})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownTool);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn schema_violation_never_reaches_handler() {
        let (dispatcher, calls) = dispatcher();
        let err = dispatcher.invoke("echo", json!({"message": 7})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn every_schema_violation_is_listed() {
        let (dispatcher, calls) = dispatcher();
        let err = dispatcher
            .invoke("echo", json!({"message": "hi", "repeat": 0, "tags": ["a", 1]}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let message = err.to_string();
        assert!(message.contains("repeat"), "{message}");
        assert!(message.contains("tags/1"), "{message}");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn null_arguments_read_as_empty_object() {
        let (dispatcher, _) = dispatcher();
        assert!(dispatcher.invoke("scalar", Value::Null).await.is_ok());
    }

    #[tokio::test]
    async fn timeout_becomes_execution_failed() {
        let (dispatcher, _) = dispatcher();
        let err = dispatcher.invoke("stall", json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
        assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
    }

    #[tokio::test]
    async fn panic_is_contained() {
        let (dispatcher, _) = dispatcher();
        let err = dispatcher.invoke("panic", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
        assert!(err.to_string().contains("panicked"));
    }

    #[tokio::test]
    async fn scalar_results_are_wrapped() {
        let (dispatcher, _) = dispatcher();
        let result = dispatcher.invoke("scalar", json!({})).await.unwrap();
        assert_eq!(result["result"], 42);
    }

    #[tokio::test]
    async fn handle_builds_failure_envelope() {
        let (dispatcher, _) = dispatcher();
        let envelope = dispatcher
            .handle(ToolRequest {
                tool: "nope".into(),
                arguments: json!({}),
            })
            .await;
        assert_eq!(envelope["status"], "failed");
        assert_eq!(envelope["tool"], "nope");
        assert_eq!(envelope["kind"], "unknown_tool");
        assert!(envelope["error"].as_str().unwrap().contains("nope"));
        assert!(
            chrono::DateTime::parse_from_rfc3339(envelope["timestamp"].as_str().unwrap()).is_ok()
        );
    }
}
