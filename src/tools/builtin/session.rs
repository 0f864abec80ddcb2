//! Session persistence and analytics tools.

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::context::InvocationContext;
use crate::error::{ErrorKind, ToolError};
use crate::events::{CRISIS_EVENTS, EventAnalytics, EventLog, FLOW_COMPLETIONS, SESSIONS};
use crate::tools::tool::{Tool, ToolOutput, parse_args};

#[derive(Debug, Deserialize)]
struct SaveArgs {
    session_data: serde_json::Map<String, Value>,
}

/// Stores an anonymized session payload.
pub struct SaveSessionTool {
    events: EventLog,
}

impl SaveSessionTool {
    pub fn new(events: EventLog) -> Self {
        Self { events }
    }
}

#[async_trait]
impl Tool for SaveSessionTool {
    fn name(&self) -> &str {
        "save_session_data"
    }

    fn description(&self) -> &str {
        "Save anonymized session data for analytics"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "session_data": {
                    "type": "object",
                    "description": "Anonymized session data to store"
                }
            },
            "required": ["session_data"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: SaveArgs = parse_args(self.name(), params)?;

        let record = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "session_data": args.session_data,
        });
        let result = match self.events.append(SESSIONS, &record).await {
            Ok(key) => json!({
                "tool": self.name(),
                "status": "success",
                "saved": true,
                "key": key,
            }),
            Err(e) => {
                warn!(
                    tool = %self.name(),
                    kind = %ErrorKind::PersistenceFailure,
                    error = %e,
                    "Session not saved"
                );
                json!({
                    "tool": self.name(),
                    "status": "error",
                    "saved": false,
                    "error": "session storage is unavailable",
                })
            }
        };

        Ok(ToolOutput::success(result, start.elapsed()))
    }
}

#[derive(Debug, Deserialize)]
struct AnalyticsArgs {
    #[serde(default = "default_category")]
    category: String,
}

fn default_category() -> String {
    CRISIS_EVENTS.to_string()
}

/// Aggregate counts over one event category.
pub struct AnalyticsTool {
    events: EventLog,
}

impl AnalyticsTool {
    pub fn new(events: EventLog) -> Self {
        Self { events }
    }
}

#[async_trait]
impl Tool for AnalyticsTool {
    fn name(&self) -> &str {
        "get_analytics"
    }

    fn description(&self) -> &str {
        "Get aggregated analytics over recorded events"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "category": {
                    "type": "string",
                    "description": "Event category to aggregate",
                    "enum": [CRISIS_EVENTS, FLOW_COMPLETIONS, SESSIONS],
                    "default": CRISIS_EVENTS
                }
            }
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: AnalyticsArgs = parse_args(self.name(), params)?;

        let result = match self.events.query(&args.category).await {
            Ok(analytics) => json!({
                "tool": self.name(),
                "category": args.category,
                "analytics": analytics,
            }),
            Err(e) => {
                warn!(
                    tool = %self.name(),
                    category = %args.category,
                    kind = %ErrorKind::PersistenceFailure,
                    error = %e,
                    "Analytics unavailable"
                );
                json!({
                    "tool": self.name(),
                    "category": args.category,
                    "analytics": EventAnalytics::empty(),
                    "error": "event storage is unavailable; totals are zeroed",
                })
            }
        };

        Ok(ToolOutput::success(result, start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::error::DatabaseError;
    use crate::store::{LibSqlObjectStore, ObjectStore};

    struct OfflineStore;

    #[async_trait]
    impl ObjectStore for OfflineStore {
        async fn put(&self, _key: &str, _body: &[u8]) -> Result<(), DatabaseError> {
            Err(DatabaseError::Pool("down".into()))
        }

        async fn list_by_prefix(&self, _prefix: &str) -> Result<Vec<Vec<u8>>, DatabaseError> {
            Err(DatabaseError::Pool("down".into()))
        }
    }

    async fn log() -> EventLog {
        EventLog::new(Arc::new(LibSqlObjectStore::new_memory().await.unwrap()))
    }

    #[tokio::test]
    async fn save_then_count() {
        let events = log().await;
        let save = SaveSessionTool::new(events.clone());
        let out = save
            .execute(
                json!({"session_data": {"mood_before": 3, "mood_after": 6}}),
                &InvocationContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(out.result["status"], "success");
        assert!(out.result["key"].as_str().unwrap().starts_with("sessions/"));

        let analytics = AnalyticsTool::new(events)
            .execute(json!({"category": "sessions"}), &InvocationContext::default())
            .await
            .unwrap();
        assert_eq!(analytics.result["analytics"]["total_events"], 1);
        assert_eq!(analytics.result["analytics"]["crisis_events"], 0);
    }

    #[tokio::test]
    async fn session_data_must_be_an_object() {
        let err = SaveSessionTool::new(log().await)
            .execute(json!({"session_data": "mood 3"}), &InvocationContext::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn analytics_default_to_crisis_events() {
        let out = AnalyticsTool::new(log().await)
            .execute(json!({}), &InvocationContext::default())
            .await
            .unwrap();
        assert_eq!(out.result["category"], "crisis_events");
        assert_eq!(out.result["analytics"]["most_common_symptom"], "none");
    }

    #[tokio::test]
    async fn save_degrades_when_store_is_down() {
        let out = SaveSessionTool::new(EventLog::new(Arc::new(OfflineStore)))
            .execute(
                json!({"session_data": {"mood_before": 3}}),
                &InvocationContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(out.result["status"], "error");
        assert_eq!(out.result["saved"], false);
        assert!(out.result.get("key").is_none());
    }

    #[tokio::test]
    async fn analytics_degrade_to_zeroed_totals() {
        let out = AnalyticsTool::new(EventLog::new(Arc::new(OfflineStore)))
            .execute(json!({"category": "sessions"}), &InvocationContext::default())
            .await
            .unwrap();
        assert_eq!(out.result["analytics"]["total_events"], 0);
        assert_eq!(out.result["analytics"]["most_used_tool"], "none");
        assert!(out.result["error"].is_string());
    }
}
