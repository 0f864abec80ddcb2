//! Values compass tools: pattern analysis, compass creation, and compass
//! checks against a dilemma.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::context::InvocationContext;
use crate::error::ToolError;
use crate::events::{ARTIFACTS, EventLog};
use crate::flows::ResponseRecord;
use crate::synthesis::{ArtifactKind, SynthesisContext, Synthesizer, prompts};
use crate::tools::tool::{Tool, ToolOutput, parse_args, require_str};

const TRUE_NORTH_COUNT: usize = 3;

const COMPASS_CHECK_FALLBACK: &str = "Take a quiet moment with each option. Ask which one you could explain to your future self with pride, and which one asks you to set a core value aside.";

#[derive(Debug, Deserialize)]
struct AnalysisArgs {
    responses: Vec<ResponseRecord>,
}

/// Ranks the values indicated across an expedition and adds an insight.
pub struct ValuesAnalysisTool {
    synthesizer: Arc<Synthesizer>,
}

impl ValuesAnalysisTool {
    pub fn new(synthesizer: Arc<Synthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl Tool for ValuesAnalysisTool {
    fn name(&self) -> &str {
        "values_synthesis_analysis"
    }

    fn description(&self) -> &str {
        "Analyze values expedition responses for patterns and suggest core values"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "responses": {
                    "type": "array",
                    "description": "Responses from the values discovery expedition"
                }
            },
            "required": ["responses"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: AnalysisArgs = parse_args(self.name(), params)?;
        let artifact = self
            .synthesizer
            .synthesize(&args.responses, ArtifactKind::PatternInsight)
            .await;

        Ok(ToolOutput::success(
            json!({
                "tool": self.name(),
                "ai_insight": artifact.insight,
                "suggested_values": artifact.ranking,
                "instruction": "Do these resonate? Please select the 3-5 that feel like your 'True North', the values that are most essentially you.",
            }),
            start.elapsed(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct CompassArgs {
    selected_values: Vec<String>,
    #[serde(default)]
    responses: Vec<ResponseRecord>,
}

/// Builds a personal values compass from the values the user selected.
pub struct CompassCreationTool {
    synthesizer: Arc<Synthesizer>,
    events: EventLog,
}

impl CompassCreationTool {
    pub fn new(synthesizer: Arc<Synthesizer>, events: EventLog) -> Self {
        Self {
            synthesizer,
            events,
        }
    }
}

#[async_trait]
impl Tool for CompassCreationTool {
    fn name(&self) -> &str {
        "values_compass_creation"
    }

    fn description(&self) -> &str {
        "Create a personalized values compass from selected core values"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "selected_values": {
                    "type": "array",
                    "description": "Values chosen by the user, most important first"
                },
                "responses": {
                    "type": "array",
                    "description": "Expedition responses used to personalize definitions"
                }
            },
            "required": ["selected_values"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: CompassArgs = parse_args(self.name(), params)?;

        let mut selected: Vec<String> = Vec::with_capacity(args.selected_values.len());
        for value in args.selected_values {
            let value = value.trim().to_string();
            if !value.is_empty() && !selected.contains(&value) {
                selected.push(value);
            }
        }
        if selected.is_empty() {
            return Err(ToolError::invalid(
                self.name(),
                "selected_values must name at least one value",
            ));
        }

        let ctx = SynthesisContext {
            selected: selected.clone(),
            ..SynthesisContext::default()
        };
        let artifact = self
            .synthesizer
            .synthesize_with(&args.responses, ArtifactKind::ValueDefinitions, &ctx)
            .await;

        let definitions: BTreeMap<String, String> = artifact
            .narratives
            .into_iter()
            .map(|n| (n.item, n.text))
            .collect();
        let split = selected.len().min(TRUE_NORTH_COUNT);
        let compass = json!({
            "true_north_values": selected[..split],
            "supporting_values": selected[split..],
            "personalized_definitions": definitions,
            "created_date": Utc::now().to_rfc3339(),
        });

        self.events.append_detached(
            ARTIFACTS,
            json!({"data_type": "values_compass", "data": compass.clone()}),
        );

        Ok(ToolOutput::success(
            json!({
                "tool": self.name(),
                "compass": compass,
                "visual_config": {
                    "primary_color": "#4a90e2",
                    "accent_color": "#7b68ee",
                    "layout": "circular_compass"
                },
                "completion_message": "Your Personal Values Compass is ready! This is your guide for authentic decision-making.",
            }),
            start.elapsed(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct CheckArgs {
    user_dilemma: String,
    user_values: Vec<String>,
    #[serde(default)]
    decision_options: Vec<String>,
}

/// Guidance on a dilemma, framed by the user's compass.
pub struct CompassCheckTool {
    synthesizer: Arc<Synthesizer>,
}

impl CompassCheckTool {
    pub fn new(synthesizer: Arc<Synthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl Tool for CompassCheckTool {
    fn name(&self) -> &str {
        "values_compass_check"
    }

    fn description(&self) -> &str {
        "Use the values compass to get guidance on a decision"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_dilemma": {"type": "string", "description": "The decision the user faces"},
                "user_values": {"type": "array", "description": "The user's core values"},
                "decision_options": {"type": "array", "description": "Options being considered"}
            },
            "required": ["user_dilemma", "user_values"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        require_str(self.name(), &params, "user_dilemma")?;
        let args: CheckArgs = parse_args(self.name(), params)?;

        let guidance = self
            .synthesizer
            .narrate(
                prompts::system_prompt(ArtifactKind::PatternInsight),
                prompts::compass_check_prompt(
                    &args.user_values,
                    &args.user_dilemma,
                    &args.decision_options,
                ),
                600,
            )
            .await;

        Ok(ToolOutput::success(
            json!({
                "tool": self.name(),
                "guidance_available": guidance.is_some(),
                "guidance": guidance.unwrap_or_else(|| COMPASS_CHECK_FALLBACK.to_string()),
                "framework": {
                    "alignment": "Which option aligns most closely with your 'True North' values?",
                    "tension": "Does this choice create significant tension with any of your core values?",
                    "integration": "Is there a third path, a creative compromise that could honor multiple values at once?"
                },
                "user_values": args.user_values,
            }),
            start.elapsed(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::error::{ErrorKind, LlmError};
    use crate::llm::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider, UnavailableLlm};
    use crate::store::LibSqlObjectStore;

    struct FixedLlm {
        reply: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for FixedLlm {
        fn model_name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CompletionResponse {
                content: self.reply.clone(),
                input_tokens: 10,
                output_tokens: 10,
                finish_reason: FinishReason::Stop,
            })
        }
    }

    fn synthesizer(llm: Arc<dyn LlmProvider>) -> Arc<Synthesizer> {
        Arc::new(Synthesizer::new(llm, Duration::from_millis(100)))
    }

    async fn events() -> EventLog {
        EventLog::new(Arc::new(LibSqlObjectStore::new_memory().await.unwrap()))
    }

    #[tokio::test]
    async fn compass_splits_true_north_from_supporting() {
        let llm = Arc::new(FixedLlm {
            reply: r#"{"autonomy": "For you, Autonomy means choosing your own path.", "creativity": "For you, Creativity means making things."}"#.into(),
            calls: AtomicUsize::new(0),
        });
        let tool = CompassCreationTool::new(synthesizer(llm.clone()), events().await);
        let out = tool
            .execute(
                json!({"selected_values": ["autonomy", "creativity", "security", "growth", "autonomy"]}),
                &InvocationContext::default(),
            )
            .await
            .unwrap();

        let compass = &out.result["compass"];
        assert_eq!(compass["true_north_values"], json!(["autonomy", "creativity", "security"]));
        assert_eq!(compass["supporting_values"], json!(["growth"]));
        assert_eq!(
            compass["personalized_definitions"]["autonomy"],
            "For you, Autonomy means choosing your own path."
        );
        assert!(compass["personalized_definitions"].get("security").is_none());
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn compass_needs_a_value() {
        let tool = CompassCreationTool::new(synthesizer(Arc::new(UnavailableLlm)), events().await);
        let err = tool
            .execute(json!({"selected_values": ["  "]}), &InvocationContext::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn check_degrades_to_static_guidance() {
        let tool = CompassCheckTool::new(synthesizer(Arc::new(UnavailableLlm)));
        let out = tool
            .execute(
                json!({"user_dilemma": "Take the job?", "user_values": ["security"]}),
                &InvocationContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(out.result["guidance_available"], false);
        assert_eq!(out.result["guidance"], COMPASS_CHECK_FALLBACK);
        assert!(out.result["framework"]["integration"].is_string());
    }

    #[tokio::test]
    async fn analysis_ranks_tags() {
        let tool = ValuesAnalysisTool::new(synthesizer(Arc::new(UnavailableLlm)));
        let record = |stage: &str, tags: &[&str]| {
            json!({
                "stage": stage,
                "sequence": 1,
                "choice": "path_a",
                "tags": tags,
            })
        };
        let out = tool
            .execute(
                json!({"responses": [
                    record("scenario_1", &["autonomy", "creativity"]),
                    record("scenario_2", &["autonomy", "security"]),
                    record("scenario_3", &["autonomy", "creativity"]),
                ]}),
                &InvocationContext::default(),
            )
            .await
            .unwrap();
        let ranked = out.result["suggested_values"].as_array().unwrap();
        assert_eq!(ranked[0]["tag"], "autonomy");
        assert_eq!(ranked[0]["count"], 3);
        assert_eq!(ranked[0]["highlighted"], true);
        assert_eq!(ranked[1]["tag"], "creativity");
        assert_eq!(ranked[2]["tag"], "security");
        assert!(out.result["ai_insight"].is_null());
    }
}
