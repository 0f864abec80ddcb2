//! Crisis classifier: one generative call, a strict parse, and a fixed
//! fallback whenever either fails.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ErrorKind;
use crate::events::{CRISIS_EVENTS, EventLog};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, complete_within, extract_json_object};
use crate::triage::{CrisisClassification, Intervention, Symptom, symptom_prompt_lines};

const CLASSIFY_MAX_TOKENS: u32 = 256;
const CLASSIFY_TEMPERATURE: f32 = 0.1;

/// Words that flag distress in the input metadata.
const DISTRESS_KEYWORDS: &[&str] = &["help", "panic", "scared", "overwhelmed", "crisis"];

/// Shape-only facts about the classified text. The text itself is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputMetadata {
    pub length: usize,
    pub word_count: usize,
    pub contains_keywords: bool,
}

impl InputMetadata {
    pub fn from_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        Self {
            length: text.chars().count(),
            word_count: text.split_whitespace().count(),
            contains_keywords: DISTRESS_KEYWORDS.iter().any(|k| lower.contains(k)),
        }
    }
}

/// Persisted record of one classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrisisEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub classification: CrisisClassification,
    pub input_metadata: InputMetadata,
    pub fallback: bool,
}

/// A classification plus why the fallback was used, if it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub classification: CrisisClassification,
    pub fallback_reason: Option<String>,
}

/// Raw collaborator output.
#[derive(Debug, Deserialize)]
struct RawClassification {
    is_crisis: bool,
    symptom_type: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default, alias = "suggested_intervention")]
    suggested_tool: Option<String>,
}

/// Classifies free text for crisis indicators.
pub struct CrisisClassifier {
    llm: Arc<dyn LlmProvider>,
    events: Option<EventLog>,
    timeout: Duration,
}

impl CrisisClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self {
            llm,
            events: None,
            timeout,
        }
    }

    /// Record every classification to `events`.
    pub fn with_event_log(mut self, events: EventLog) -> Self {
        self.events = Some(events);
        self
    }

    /// Classify `text`. Never fails.
    pub async fn classify(&self, text: &str) -> CrisisClassification {
        self.assess(text).await.classification
    }

    /// Classify `text`, reporting whether the fallback was used.
    pub async fn assess(&self, text: &str) -> Assessment {
        let assessment = match self.request(text).await {
            Ok(classification) => Assessment {
                classification,
                fallback_reason: None,
            },
            Err(reason) => {
                warn!(
                    model = %self.llm.model_name(),
                    kind = %ErrorKind::CollaboratorUnavailable,
                    reason = %reason,
                    "Crisis classification fell back"
                );
                Assessment {
                    classification: CrisisClassification::FALLBACK,
                    fallback_reason: Some(reason),
                }
            }
        };

        info!(
            is_crisis = assessment.classification.is_crisis,
            symptom = %assessment.classification.symptom_type,
            confidence = assessment.classification.confidence,
            fallback = assessment.fallback_reason.is_some(),
            "Crisis classification"
        );

        self.record(text, &assessment);
        assessment
    }

    async fn request(&self, text: &str) -> Result<CrisisClassification, String> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_classify_system_prompt()),
            ChatMessage::user(build_classify_user_prompt(text)),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let response = complete_within(self.llm.as_ref(), request, self.timeout)
            .await
            .map_err(|e| format!("collaborator call failed: {e}"))?;

        parse_classification(&response.content)
    }

    /// Fire-and-forget write; the caller never waits on it.
    fn record(&self, text: &str, assessment: &Assessment) {
        let Some(events) = &self.events else {
            return;
        };
        events.append_detached(
            CRISIS_EVENTS,
            CrisisEvent {
                timestamp: Utc::now(),
                classification: assessment.classification,
                input_metadata: InputMetadata::from_text(text),
                fallback: assessment.fallback_reason.is_some(),
            },
        );
    }
}

fn build_classify_system_prompt() -> String {
    let interventions = Intervention::ALL
        .iter()
        .map(|i| i.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You analyze short messages from young people for mental health crisis signs.\n\n\
         Classify the PRIMARY symptom type:\n{}\n\n\
         Also suggest one intervention from: {}.\n\n\
         Respond ONLY with valid JSON:\n\
         {{\"is_crisis\": true, \"symptom_type\": \"racing_thoughts\", \"confidence\": 85, \"suggested_tool\": \"visual_focus\"}}",
        symptom_prompt_lines(),
        interventions,
    )
}

fn build_classify_user_prompt(text: &str) -> String {
    let preview: String = text.chars().take(2000).collect();
    format!("Analyze this text for mental health crisis signs: \"{preview}\"")
}

/// Parse collaborator output into a classification.
///
/// Unknown symptoms are a parse failure. A missing or unknown tool falls
/// back to the symptom's catalog intervention.
fn parse_classification(raw: &str) -> Result<CrisisClassification, String> {
    let json = extract_json_object(raw);
    let parsed: RawClassification =
        serde_json::from_str(&json).map_err(|e| format!("JSON parse error: {e}"))?;

    let symptom_type = Symptom::parse(&parsed.symptom_type)
        .ok_or_else(|| format!("unknown symptom type '{}'", parsed.symptom_type))?;

    let suggested_tool = parsed
        .suggested_tool
        .as_deref()
        .and_then(Intervention::parse)
        .unwrap_or_else(|| symptom_type.intervention());

    let confidence = if parsed.confidence.is_finite() {
        parsed.confidence.clamp(0.0, 100.0).round() as u8
    } else {
        0
    };

    Ok(CrisisClassification {
        is_crisis: parsed.is_crisis,
        symptom_type,
        confidence,
        suggested_tool,
    })
}
