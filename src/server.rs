//! HTTP transport over the dispatcher.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::error::ErrorKind;
use crate::tools::{Dispatcher, failure_envelope};

/// GET /api/tools
///
/// Definitions of every registered tool, sorted by name.
async fn list_tools(State(dispatcher): State<Dispatcher>) -> impl IntoResponse {
    Json(dispatcher.registry().tool_definitions().await)
}

/// POST /api/tools/{name}
///
/// The body is the arguments object. An empty body means no arguments.
async fn invoke_tool(
    State(dispatcher): State<Dispatcher>,
    Path(name): Path<String>,
    body: Option<Json<Value>>,
) -> impl IntoResponse {
    let arguments = body.map(|Json(v)| v).unwrap_or(Value::Null);
    match dispatcher.invoke(&name, arguments).await {
        Ok(result) => (StatusCode::OK, Json(result)),
        Err(err) => (status_for(err.kind()), Json(failure_envelope(&name, &err))),
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::UnknownTool => StatusCode::NOT_FOUND,
        ErrorKind::InvalidArgument | ErrorKind::InvalidChoice | ErrorKind::SessionComplete => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::CollaboratorUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::PersistenceFailure | ErrorKind::ExecutionFailed => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Build the tool REST routes.
pub fn tool_routes(dispatcher: Dispatcher) -> Router {
    Router::new()
        .route("/api/tools", get(list_tools))
        .route("/api/tools/{name}", post(invoke_tool))
        .layer(CorsLayer::permissive())
        .with_state(dispatcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::tools::ToolRegistry;
    use crate::tools::builtin::crisis::SosTriageTool;

    fn app() -> Router {
        let registry = ToolRegistry::new();
        registry.register_sync(Arc::new(SosTriageTool));
        tool_routes(Dispatcher::new(Arc::new(registry), Duration::from_secs(5)))
    }

    async fn send(req: Request<Body>) -> (StatusCode, Value) {
        let resp = app().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn lists_definitions() {
        let (status, body) = send(
            Request::get("/api/tools").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "sos_triage");
    }

    #[tokio::test]
    async fn invokes_with_empty_body() {
        let (status, body) = send(
            Request::post("/api/tools/sos_triage").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["timestamp"].is_string());
        assert_eq!(body["options"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let (status, body) = send(
            Request::post("/api/tools/nope")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "unknown_tool");
        assert_eq!(body["status"], "failed");
    }

    #[test]
    fn argument_errors_are_bad_requests() {
        assert_eq!(status_for(ErrorKind::InvalidChoice), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(ErrorKind::ExecutionFailed),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
