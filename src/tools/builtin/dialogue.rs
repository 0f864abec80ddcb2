//! Dialogue gym tools: scenario catalog, role-play persona, live coaching,
//! and the post-session analysis.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::context::InvocationContext;
use crate::dialogue::{self, Scenario, Turn, ZONES};
use crate::error::ToolError;
use crate::synthesis::Synthesizer;
use crate::tools::tool::{Tool, ToolOutput, parse_args};

const PERSONA_SYSTEM: &str = "You are playing a character in a conversation practice exercise. Stay in character.";
const COACH_SYSTEM: &str = "You are an expert communication coach. Be brief and kind.";
const ANALYSIS_SYSTEM: &str = "You are an encouraging communication coach reviewing a practice session.";

fn scenario_for(tool: &str, id: &str) -> Result<&'static Scenario, ToolError> {
    dialogue::find_scenario(id).ok_or_else(|| ToolError::invalid(tool, format!("unknown scenario '{id}'")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CatalogAction {
    ListZones,
    GetScenarios,
}

#[derive(Debug, Deserialize)]
struct ScenariosArgs {
    action: CatalogAction,
    #[serde(default)]
    zone: Option<String>,
}

/// Lists practice zones and their scenarios. No external calls.
pub struct DialogueScenariosTool;

#[async_trait]
impl Tool for DialogueScenariosTool {
    fn name(&self) -> &str {
        "dialogue_gym_scenarios"
    }

    fn description(&self) -> &str {
        "List dialogue practice zones, or the scenarios within one zone"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {"type": "string", "enum": ["list_zones", "get_scenarios"]},
                "zone": {"type": "string", "description": "Zone id, for get_scenarios"}
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: ScenariosArgs = parse_args(self.name(), params)?;

        let result = match args.action {
            CatalogAction::ListZones => {
                let zones: Vec<Value> = ZONES
                    .iter()
                    .map(|z| {
                        json!({
                            "id": z.id,
                            "name": z.name,
                            "description": z.description,
                            "scenario_count": z.scenarios.len(),
                        })
                    })
                    .collect();
                json!({"tool": self.name(), "action": "list_zones", "zones": zones})
            }
            CatalogAction::GetScenarios => {
                let zone_id = args
                    .zone
                    .ok_or_else(|| ToolError::invalid(self.name(), "get_scenarios requires 'zone'"))?;
                let zone = dialogue::zone(&zone_id)
                    .ok_or_else(|| ToolError::invalid(self.name(), format!("unknown zone '{zone_id}'")))?;
                json!({
                    "tool": self.name(),
                    "action": "get_scenarios",
                    "zone": zone.id,
                    "zone_name": zone.name,
                    "scenarios": zone.scenarios,
                })
            }
        };
        Ok(ToolOutput::success(result, start.elapsed()))
    }
}

#[derive(Debug, Deserialize)]
struct PersonaArgs {
    scenario_id: String,
    user_message: String,
    #[serde(default)]
    conversation_history: Vec<Turn>,
    #[serde(default)]
    turn_number: Option<u32>,
}

/// Replies in character for the chosen scenario.
pub struct DialoguePersonaTool {
    synthesizer: Arc<Synthesizer>,
}

impl DialoguePersonaTool {
    pub fn new(synthesizer: Arc<Synthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl Tool for DialoguePersonaTool {
    fn name(&self) -> &str {
        "dialogue_gym_persona"
    }

    fn description(&self) -> &str {
        "Role-play the other person in a dialogue practice scenario"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "scenario_id": {"type": "string"},
                "user_message": {"type": "string"},
                "conversation_history": {"type": "array", "description": "Earlier turns as {speaker, message}"},
                "turn_number": {"type": "integer"}
            },
            "required": ["scenario_id", "user_message"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: PersonaArgs = parse_args(self.name(), params)?;
        let scenario = scenario_for(self.name(), &args.scenario_id)?;

        let reply = self
            .synthesizer
            .narrate(
                PERSONA_SYSTEM,
                dialogue::persona_prompt(scenario, &args.conversation_history, &args.user_message),
                200,
            )
            .await;

        Ok(ToolOutput::success(
            json!({
                "tool": self.name(),
                "scenario_id": scenario.id,
                "persona_available": reply.is_some(),
                "persona_response": reply.unwrap_or_else(|| dialogue::PERSONA_FALLBACK.to_string()),
                "turn_number": args.turn_number.unwrap_or(1),
            }),
            start.elapsed(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct CoachArgs {
    scenario_goal: String,
    user_message: String,
    #[serde(default)]
    persona_message: String,
}

/// One line of feedback on the user's last message.
pub struct DialogueCoachTool {
    synthesizer: Arc<Synthesizer>,
}

impl DialogueCoachTool {
    pub fn new(synthesizer: Arc<Synthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl Tool for DialogueCoachTool {
    fn name(&self) -> &str {
        "dialogue_gym_coach"
    }

    fn description(&self) -> &str {
        "Give one sentence of live coaching on the user's last message"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "scenario_goal": {"type": "string"},
                "user_message": {"type": "string"},
                "persona_message": {"type": "string"}
            },
            "required": ["scenario_goal", "user_message"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: CoachArgs = parse_args(self.name(), params)?;

        let feedback = self
            .synthesizer
            .narrate(
                COACH_SYSTEM,
                dialogue::coach_prompt(&args.scenario_goal, &args.persona_message, &args.user_message),
                80,
            )
            .await;

        Ok(ToolOutput::success(
            json!({
                "tool": self.name(),
                "feedback": feedback.unwrap_or_else(|| dialogue::COACH_FALLBACK.to_string()),
                "user_message": args.user_message,
            }),
            start.elapsed(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct AnalysisArgs {
    scenario_id: String,
    #[serde(default)]
    conversation_history: Vec<Turn>,
    #[serde(default)]
    coach_feedback: Vec<String>,
}

/// Post-session ratings, strengths, and growth areas.
pub struct DialogueAnalysisTool {
    synthesizer: Arc<Synthesizer>,
}

impl DialogueAnalysisTool {
    pub fn new(synthesizer: Arc<Synthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl Tool for DialogueAnalysisTool {
    fn name(&self) -> &str {
        "dialogue_gym_analysis"
    }

    fn description(&self) -> &str {
        "Analyze a finished dialogue practice session"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "scenario_id": {"type": "string"},
                "conversation_history": {"type": "array"},
                "coach_feedback": {"type": "array"}
            },
            "required": ["scenario_id"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: AnalysisArgs = parse_args(self.name(), params)?;
        let scenario = scenario_for(self.name(), &args.scenario_id)?;

        let analysis = self
            .synthesizer
            .narrate(
                ANALYSIS_SYSTEM,
                dialogue::analysis_prompt(scenario, &args.conversation_history, &args.coach_feedback),
                600,
            )
            .await;

        Ok(ToolOutput::success(
            json!({
                "tool": self.name(),
                "scenario": scenario,
                "analysis_available": analysis.is_some(),
                "performance_analysis": analysis.unwrap_or_else(|| dialogue::ANALYSIS_FALLBACK.to_string()),
                "conversation_length": args.conversation_history.len(),
            }),
            start.elapsed(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::error::ErrorKind;
    use crate::llm::UnavailableLlm;

    fn synthesizer() -> Arc<Synthesizer> {
        Arc::new(Synthesizer::new(
            Arc::new(UnavailableLlm),
            Duration::from_millis(100),
        ))
    }

    #[tokio::test]
    async fn lists_four_zones() {
        let out = DialogueScenariosTool
            .execute(json!({"action": "list_zones"}), &InvocationContext::default())
            .await
            .unwrap();
        let zones = out.result["zones"].as_array().unwrap();
        assert_eq!(zones.len(), 4);
        assert_eq!(zones[0]["scenario_count"], 2);
    }

    #[tokio::test]
    async fn get_scenarios_needs_known_zone() {
        let missing = DialogueScenariosTool
            .execute(json!({"action": "get_scenarios"}), &InvocationContext::default())
            .await
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::InvalidArgument);

        let out = DialogueScenariosTool
            .execute(
                json!({"action": "get_scenarios", "zone": "heart_to_heart"}),
                &InvocationContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(out.result["scenarios"][0]["id"], "heart_1");
    }

    #[tokio::test]
    async fn persona_rejects_unknown_scenario() {
        let err = DialoguePersonaTool::new(synthesizer())
            .execute(
                json!({"scenario_id": "nope", "user_message": "hi"}),
                &InvocationContext::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn coach_falls_back_to_static_tip() {
        let out = DialogueCoachTool::new(synthesizer())
            .execute(
                json!({"scenario_goal": "Decline kindly", "user_message": "No way."}),
                &InvocationContext::default(),
            )
            .await
            .unwrap();
        assert!(out.result["feedback"].as_str().unwrap().starts_with("Try:"));
    }

    #[tokio::test]
    async fn analysis_counts_turns() {
        let out = DialogueAnalysisTool::new(synthesizer())
            .execute(
                json!({
                    "scenario_id": "assert_1",
                    "conversation_history": [
                        {"speaker": "persona", "message": "Could you lend me $200?"},
                        {"speaker": "user", "message": "I can't this time."}
                    ]
                }),
                &InvocationContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(out.result["conversation_length"], 2);
        assert_eq!(out.result["analysis_available"], false);
        assert_eq!(out.result["scenario"]["title"], "Friend Wants to Borrow Money");
    }
}
