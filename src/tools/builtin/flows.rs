//! Guided flow tools. One tool per flow definition; every call carries the
//! full history, so nothing is held between calls.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::context::InvocationContext;
use crate::error::ToolError;
use crate::events::{EventLog, FLOW_COMPLETIONS};
use crate::flows::catalog::EMPATHY_MAP_INQUIRY;
use crate::flows::payload::{complete_payload, stage_payload};
use crate::flows::{FlowDefinition, ResponseRecord, START, SessionState, StageInput};
use crate::synthesis::{SynthesisContext, Synthesizer, rank_tags};
use crate::tools::tool::{Tool, ToolOutput, parse_args};

#[derive(Debug, Deserialize)]
struct FlowArgs {
    #[serde(default = "start_stage")]
    stage: String,
    #[serde(default)]
    choice: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    responses: Vec<ResponseRecord>,
    #[serde(default)]
    person_name: Option<String>,
    #[serde(default)]
    conversation_goal: Option<String>,
}

fn start_stage() -> String {
    START.to_string()
}

/// Serves one guided flow.
pub struct FlowTool {
    flow: FlowDefinition,
    description: String,
    synthesizer: Arc<Synthesizer>,
    events: EventLog,
}

impl FlowTool {
    pub fn new(flow: FlowDefinition, synthesizer: Arc<Synthesizer>, events: EventLog) -> Self {
        let description = format!(
            "{}: guided flow of {} stages. Call with stage \"start\", then submit each stage \
             with the responses returned by the previous call.",
            flow.title,
            flow.stages.len()
        );
        Self {
            flow,
            description,
            synthesizer,
            events,
        }
    }

    fn input(&self, args: &FlowArgs) -> Result<StageInput, ToolError> {
        match (&args.choice, &args.text) {
            (Some(_), Some(_)) => Err(ToolError::invalid(
                self.name(),
                "provide either 'choice' or 'text', not both",
            )),
            (Some(choice), None) => Ok(StageInput::Choice(choice.clone())),
            (None, Some(text)) => Ok(StageInput::Text(text.clone())),
            (None, None) => Ok(StageInput::None),
        }
    }

    async fn finish(&self, history: &[ResponseRecord], ctx: SynthesisContext) -> Value {
        let artifact = match self.flow.synthesis {
            Some(kind) => Some(self.synthesizer.synthesize_with(history, kind, &ctx).await),
            None => None,
        };

        let ranking: Vec<Value> = rank_tags(history)
            .into_iter()
            .map(|(tag, count)| json!({"tag": tag, "count": count}))
            .collect();
        self.events.append_detached(
            FLOW_COMPLETIONS,
            json!({
                "flow": self.flow.id,
                "response_count": history.len(),
                "ranking": ranking,
                "completed_at": Utc::now().to_rfc3339(),
            }),
        );

        info!(flow = %self.flow.id, responses = history.len(), "Flow completed");
        complete_payload(&self.flow, history, artifact.as_ref())
    }
}

#[async_trait]
impl Tool for FlowTool {
    fn name(&self) -> &str {
        &self.flow.id
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "stage": {
                    "type": "string",
                    "description": "Stage being answered, or \"start\"",
                    "default": START
                },
                "choice": {
                    "type": "string",
                    "description": "Option key for choice stages"
                },
                "text": {
                    "type": "string",
                    "description": "Answer for free-text stages"
                },
                "responses": {
                    "type": "array",
                    "description": "History returned by the previous call"
                }
            }
        });
        if self.flow.id == EMPATHY_MAP_INQUIRY
            && let Some(props) = schema["properties"].as_object_mut()
        {
            props.insert(
                "person_name".to_string(),
                json!({"type": "string", "description": "Who the empathy map is about"}),
            );
            props.insert(
                "conversation_goal".to_string(),
                json!({"type": "string", "description": "What the user wants them to understand"}),
            );
        }
        schema
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: FlowArgs = parse_args(self.name(), params)?;
        let input = self.input(&args)?;

        let session = SessionState::resume(&self.flow, &args.stage, args.responses);
        let next = session
            .apply(&self.flow, &input)
            .map_err(|source| ToolError::Flow {
                name: self.name().to_string(),
                source,
            })?;
        debug!(
            flow = %self.flow.id,
            stage = %session.stage,
            next = %next.stage,
            sequence = next.sequence,
            "Flow advanced"
        );

        let mut payload = if next.is_complete() {
            let ctx = SynthesisContext {
                person: args.person_name,
                goal: args.conversation_goal,
                ..SynthesisContext::default()
            };
            self.finish(&next.responses, ctx).await
        } else {
            stage_payload(&self.flow, &next.stage, &next.responses)
        };
        if let Some(map) = payload.as_object_mut() {
            map.insert("sequence".to_string(), json!(next.sequence));
        }

        Ok(ToolOutput::success(payload, start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::error::ErrorKind;
    use crate::flows::{COMPLETE, catalog};
    use crate::llm::UnavailableLlm;
    use crate::store::LibSqlObjectStore;

    async fn tool(flow: FlowDefinition) -> FlowTool {
        let events = EventLog::new(Arc::new(LibSqlObjectStore::new_memory().await.unwrap()));
        let synthesizer = Arc::new(Synthesizer::new(
            Arc::new(UnavailableLlm),
            Duration::from_millis(100),
        ));
        FlowTool::new(flow, synthesizer, events)
    }

    async fn call(tool: &FlowTool, params: Value) -> Result<Value, ToolError> {
        tool.execute(params, &InvocationContext::default())
            .await
            .map(|o| o.result)
    }

    #[tokio::test]
    async fn walk_a_mile_round_trip() {
        let tool = tool(catalog::walk_a_mile()).await;
        let mut payload = call(&tool, json!({"stage": "start"})).await.unwrap();
        assert_eq!(payload["stage"], "scenario_1");

        for choice in ["approach_b", "approach_a", "approach_b"] {
            payload = call(
                &tool,
                json!({
                    "stage": payload["stage"],
                    "choice": choice,
                    "responses": payload["responses_so_far"],
                }),
            )
            .await
            .unwrap();
        }
        assert_eq!(payload["stage"], "complete");
        assert_eq!(payload["responses_so_far"].as_array().unwrap().len(), 3);
        assert!(payload["artifact"].is_null());
    }

    #[tokio::test]
    async fn completion_degrades_without_collaborator() {
        let tool = tool(catalog::future_self_input()).await;
        let mut payload = call(&tool, json!({})).await.unwrap();
        for answer in ["a teacher", "a sunny classroom", "proud", "morning run", "patience"] {
            payload = call(
                &tool,
                json!({
                    "stage": payload["stage"],
                    "text": answer,
                    "responses": payload["responses_so_far"],
                }),
            )
            .await
            .unwrap();
        }
        assert_eq!(payload["stage"], "complete");
        assert_eq!(payload["artifact"]["kind"], "future_narrative");
        assert!(payload["artifact"].get("insight").is_none());
    }

    #[tokio::test]
    async fn choice_and_text_together_is_invalid() {
        let tool = tool(catalog::walk_a_mile()).await;
        let err = call(
            &tool,
            json!({"stage": "scenario_1", "choice": "approach_a", "text": "both"}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn invalid_choice_surfaces_flow_kind() {
        let tool = tool(catalog::walk_a_mile()).await;
        let err = call(&tool, json!({"stage": "scenario_1", "choice": "approach_z"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidChoice);
    }

    #[tokio::test]
    async fn empathy_schema_has_person_fields() {
        let empathy = tool(catalog::empathy_map_inquiry()).await;
        assert!(empathy.parameters_schema()["properties"]["person_name"].is_object());
        let walk = tool(catalog::walk_a_mile()).await;
        assert!(walk.parameters_schema()["properties"]["person_name"].is_null());
    }

    #[tokio::test]
    async fn progress_rises_by_one_per_accepted_submission() {
        for flow in catalog::all_flows() {
            let total = flow.stages.len() as u64;
            let id = flow.id.clone();
            let tool = tool(flow).await;

            let mut payload = call(&tool, json!({"stage": "start"})).await.unwrap();
            let mut current = payload["progress"]["current"].as_u64().unwrap();
            assert_eq!(current, 1, "{id}");
            let mut accepted = 0u64;

            while payload["stage"] != COMPLETE {
                assert!(current <= total, "{id}: {current} > {total}");
                assert_eq!(payload["progress"]["total"], total);

                let (rejected, valid) = if payload["input"]["type"] == "choice" {
                    (
                        json!({"choice": "not_an_option"}),
                        json!({"choice": payload["input"]["options"][0]["key"]}),
                    )
                } else {
                    (json!({"text": "   "}), json!({"text": "an honest answer"}))
                };
                let at_stage = |mut args: Value| {
                    args["stage"] = payload["stage"].clone();
                    args["responses"] = payload["responses_so_far"].clone();
                    args
                };

                // a rejected submission leaves the same stage open
                assert!(call(&tool, at_stage(rejected)).await.is_err(), "{id}");
                let next = call(&tool, at_stage(valid)).await.unwrap();
                accepted += 1;
                assert_eq!(next["sequence"], accepted);

                if next["stage"] != COMPLETE {
                    let advanced = next["progress"]["current"].as_u64().unwrap();
                    assert_eq!(advanced, current + 1, "{id}");
                    current = advanced;
                }
                payload = next;
            }

            assert_eq!(current, total, "{id}");
            assert_eq!(accepted, total, "{id}");
        }
    }
}
