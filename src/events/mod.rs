//! Append-only event log with aggregate analytics.
//!
//! Records are JSON objects written under `<category>/<timestamp>_<uuid>.json`.
//! Nothing in the core depends on a write having succeeded; callers on the
//! request path spawn writes and log failures.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DatabaseError, ErrorKind};
use crate::store::ObjectStore;

/// Crisis classifications.
pub const CRISIS_EVENTS: &str = "crisis_events";
/// Completed guided flows.
pub const FLOW_COMPLETIONS: &str = "flow_completions";
/// Caller-supplied session payloads.
pub const SESSIONS: &str = "sessions";
/// Saved artifacts: value compasses, empathy maps, future-self visions.
pub const ARTIFACTS: &str = "artifacts";

/// Aggregate counts over one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventAnalytics {
    pub total_events: u64,
    pub crisis_events: u64,
    pub crisis_rate_percent: f64,
    pub symptom_distribution: BTreeMap<String, u64>,
    pub tool_usage: BTreeMap<String, u64>,
    pub most_common_symptom: String,
    pub most_used_tool: String,
}

impl EventAnalytics {
    /// Zeroed analytics, reported when the store cannot be read.
    pub fn empty() -> Self {
        Self {
            total_events: 0,
            crisis_events: 0,
            crisis_rate_percent: 0.0,
            symptom_distribution: BTreeMap::new(),
            tool_usage: BTreeMap::new(),
            most_common_symptom: "none".to_string(),
            most_used_tool: "none".to_string(),
        }
    }
}

/// The fields analytics reads from a record. Anything else is ignored.
#[derive(Debug, Deserialize)]
struct AnalyticsRecord {
    #[serde(default, alias = "crisis_detected")]
    is_crisis: bool,
    #[serde(default)]
    symptom_type: Option<String>,
    #[serde(default)]
    suggested_tool: Option<String>,
}

/// Event log over an object store.
#[derive(Clone)]
pub struct EventLog {
    store: Arc<dyn ObjectStore>,
}

impl EventLog {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Append `record` to `category`, returning the key it was stored under.
    pub async fn append<T: Serialize + ?Sized>(
        &self,
        category: &str,
        record: &T,
    ) -> Result<String, DatabaseError> {
        let body = encode(record)?;
        self.put_encoded(category, &body).await
    }

    /// Append on a spawned task. Failures are logged, never returned.
    ///
    /// The record is encoded before spawning, so the task only owns bytes.
    pub fn append_detached<T: Serialize>(&self, category: &str, record: T) {
        let body = match encode(&record) {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    category = %category,
                    kind = %ErrorKind::PersistenceFailure,
                    error = %e,
                    "Failed to encode event"
                );
                return;
            }
        };
        let log = self.clone();
        let category = category.to_string();
        tokio::spawn(async move {
            if let Err(e) = log.put_encoded(&category, &body).await {
                warn!(
                    category = %category,
                    kind = %ErrorKind::PersistenceFailure,
                    error = %e,
                    "Failed to record event"
                );
            }
        });
    }

    async fn put_encoded(&self, category: &str, body: &[u8]) -> Result<String, DatabaseError> {
        let key = event_key(category);
        self.store.put(&key, body).await?;
        debug!(category = %category, key = %key, "Event appended");
        Ok(key)
    }

    /// Aggregate every record in `category`. Unreadable records are skipped.
    pub async fn query(&self, category: &str) -> Result<EventAnalytics, DatabaseError> {
        let bodies = self.store.list_by_prefix(&format!("{category}/")).await?;

        let mut total_events = 0u64;
        let mut crisis_events = 0u64;
        let mut symptom_distribution: BTreeMap<String, u64> = BTreeMap::new();
        let mut tool_usage: BTreeMap<String, u64> = BTreeMap::new();

        for body in bodies {
            let record: AnalyticsRecord = match serde_json::from_slice(&body) {
                Ok(r) => r,
                Err(e) => {
                    warn!(category = %category, error = %e, "Skipping unreadable event");
                    continue;
                }
            };
            total_events += 1;
            if record.is_crisis {
                crisis_events += 1;
                let symptom = record.symptom_type.unwrap_or_else(|| "unknown".to_string());
                *symptom_distribution.entry(symptom).or_default() += 1;
                let tool = record.suggested_tool.unwrap_or_else(|| "none".to_string());
                *tool_usage.entry(tool).or_default() += 1;
            }
        }

        Ok(EventAnalytics {
            total_events,
            crisis_events,
            crisis_rate_percent: crisis_rate(crisis_events, total_events),
            most_common_symptom: most_frequent(&symptom_distribution),
            most_used_tool: most_frequent(&tool_usage),
            symptom_distribution,
            tool_usage,
        })
    }
}

fn encode<T: Serialize + ?Sized>(record: &T) -> Result<Vec<u8>, DatabaseError> {
    serde_json::to_vec(record)
        .map_err(|e| DatabaseError::Serialization(format!("Failed to encode event: {e}")))
}

/// `<category>/<timestamp>_<uuid>.json`; keys sort chronologically.
fn event_key(category: &str) -> String {
    format!(
        "{}/{}_{}.json",
        category,
        Utc::now().format("%Y%m%dT%H%M%S%.6fZ"),
        Uuid::new_v4().simple()
    )
}

/// Percentage rounded to one decimal place.
fn crisis_rate(crisis: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (crisis as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Highest count wins; ties go to the alphabetically first key.
fn most_frequent(counts: &BTreeMap<String, u64>) -> String {
    let mut best: Option<(&String, u64)> = None;
    for (key, &count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((key, count));
        }
    }
    best.map(|(k, _)| k.clone())
        .unwrap_or_else(|| "none".to_string())
}
