//! Empathy map tools: session setup, the four-quadrant map, and the
//! conversation strategy built from it.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::context::InvocationContext;
use crate::error::ToolError;
use crate::events::{ARTIFACTS, EventLog};
use crate::flows::ResponseRecord;
use crate::flows::catalog::EMPATHY_MAP_INQUIRY;
use crate::synthesis::{ArtifactKind, SynthesisContext, Synthesizer};
use crate::tools::tool::{Tool, ToolOutput, parse_args, require_str};

const DEFAULT_RELATIONSHIP: &str = "someone important";

#[derive(Debug, Deserialize)]
struct SetupArgs {
    person_name: String,
    conversation_goal: String,
    #[serde(default)]
    relationship: Option<String>,
}

/// Starts an empathy mapping session.
pub struct EmpathySetupTool {
    events: EventLog,
}

impl EmpathySetupTool {
    pub fn new(events: EventLog) -> Self {
        Self { events }
    }
}

#[async_trait]
impl Tool for EmpathySetupTool {
    fn name(&self) -> &str {
        "empathy_map_setup"
    }

    fn description(&self) -> &str {
        "Set up an empathy mapping session for an important conversation"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "person_name": {"type": "string", "description": "Who the conversation is with"},
                "conversation_goal": {"type": "string", "description": "What the user wants them to understand"},
                "relationship": {"type": "string", "description": "Relationship to the user"}
            },
            "required": ["person_name", "conversation_goal"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        require_str(self.name(), &params, "person_name")?;
        let args: SetupArgs = parse_args(self.name(), params)?;
        let person = args.person_name.trim().to_string();
        let relationship = args
            .relationship
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RELATIONSHIP.to_string());

        self.events.append_detached(
            ARTIFACTS,
            json!({
                "data_type": "empathy_setup",
                "data": {
                    "person_name": person,
                    "conversation_goal": args.conversation_goal,
                    "relationship": relationship,
                    "created_at": Utc::now().to_rfc3339(),
                }
            }),
        );

        Ok(ToolOutput::success(
            json!({
                "tool": self.name(),
                "setup_complete": true,
                "person_name": person,
                "goal": args.conversation_goal,
                "relationship": relationship,
                "message": format!(
                    "Perfect! We're building an empathy map for {person}. Remember, the goal isn't to win an argument, but to build a bridge of understanding so your message can be truly heard."
                ),
                "next_step": EMPATHY_MAP_INQUIRY,
            }),
            start.elapsed(),
        ))
    }
}

/// The four quadrants, lifted from the generated map when its headings
/// can be found.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Quadrants {
    pub hopes_values: Vec<String>,
    pub fears_anxieties: Vec<String>,
    pub external_influences: Vec<String>,
    pub unspoken_core: String,
}

#[derive(Clone, Copy)]
enum Section {
    Hopes,
    Fears,
    Influences,
    Core,
}

fn section_heading(line: &str) -> Option<Section> {
    let upper = line.to_uppercase();
    if upper.contains("HOPES") {
        Some(Section::Hopes)
    } else if upper.contains("FEARS") {
        Some(Section::Fears)
    } else if upper.contains("EXTERNAL INFLUENCES") {
        Some(Section::Influences)
    } else if upper.contains("UNSPOKEN CORE") {
        Some(Section::Core)
    } else {
        None
    }
}

/// Split a generated empathy map into quadrants. Unrecognized text is left
/// to `raw_analysis`.
pub fn parse_quadrants(text: &str) -> Quadrants {
    let mut quadrants = Quadrants::default();
    let mut current: Option<Section> = None;
    let mut core_lines: Vec<String> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let bullet = line
            .strip_prefix("- ")
            .or_else(|| line.strip_prefix("* "))
            .or_else(|| line.strip_prefix("• "));
        if bullet.is_none()
            && let Some(section) = section_heading(line)
        {
            current = Some(section);
            continue;
        }
        let item = bullet.unwrap_or(line).trim().to_string();
        match current {
            Some(Section::Hopes) if bullet.is_some() => quadrants.hopes_values.push(item),
            Some(Section::Fears) if bullet.is_some() => quadrants.fears_anxieties.push(item),
            Some(Section::Influences) if bullet.is_some() => {
                quadrants.external_influences.push(item)
            }
            Some(Section::Core) => core_lines.push(item),
            _ => {}
        }
    }
    quadrants.unspoken_core = core_lines.join(" ");
    quadrants
}

#[derive(Debug, Deserialize)]
struct SynthesisArgs {
    responses: Vec<ResponseRecord>,
    #[serde(default)]
    person_name: Option<String>,
    #[serde(default)]
    conversation_goal: Option<String>,
}

/// Builds the four-quadrant empathy map from inquiry responses.
pub struct EmpathySynthesisTool {
    synthesizer: Arc<Synthesizer>,
    events: EventLog,
}

impl EmpathySynthesisTool {
    pub fn new(synthesizer: Arc<Synthesizer>, events: EventLog) -> Self {
        Self {
            synthesizer,
            events,
        }
    }
}

#[async_trait]
impl Tool for EmpathySynthesisTool {
    fn name(&self) -> &str {
        "empathy_map_synthesis"
    }

    fn description(&self) -> &str {
        "Create a four-quadrant empathy map from inquiry responses"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "responses": {"type": "array", "description": "Responses from the empathy map inquiry"},
                "person_name": {"type": "string"},
                "conversation_goal": {"type": "string"}
            },
            "required": ["responses"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: SynthesisArgs = parse_args(self.name(), params)?;
        let ctx = SynthesisContext {
            person: args.person_name.clone(),
            goal: args.conversation_goal.clone(),
            ..SynthesisContext::default()
        };
        let artifact = self
            .synthesizer
            .synthesize_with(&args.responses, ArtifactKind::EmpathyMap, &ctx)
            .await;

        let quadrants = artifact
            .insight
            .as_deref()
            .map(parse_quadrants)
            .unwrap_or_default();
        let empathy_map = json!({
            "person_name": args.person_name,
            "conversation_goal": args.conversation_goal,
            "quadrants": quadrants,
            "raw_analysis": artifact.insight,
            "created_at": Utc::now().to_rfc3339(),
        });

        self.events.append_detached(
            ARTIFACTS,
            json!({"data_type": "empathy_map", "data": empathy_map.clone()}),
        );

        Ok(ToolOutput::success(
            json!({
                "tool": self.name(),
                "empathy_map": empathy_map,
                "visual_ready": artifact.insight.is_some(),
                "message": "Your empathy map has been created! This reveals the deeper motivations and fears driving their perspective.",
            }),
            start.elapsed(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct StrategyArgs {
    empathy_map: serde_json::Map<String, Value>,
    conversation_goal: String,
}

/// Turns an empathy map into conversation strategy.
pub struct EmpathyStrategyTool {
    synthesizer: Arc<Synthesizer>,
}

impl EmpathyStrategyTool {
    pub fn new(synthesizer: Arc<Synthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl Tool for EmpathyStrategyTool {
    fn name(&self) -> &str {
        "empathy_map_strategy"
    }

    fn description(&self) -> &str {
        "Convert empathy map insights into a conversation strategy"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "empathy_map": {"type": "object", "description": "Map returned by empathy_map_synthesis"},
                "conversation_goal": {"type": "string"}
            },
            "required": ["empathy_map", "conversation_goal"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: StrategyArgs = parse_args(self.name(), params)?;
        let person = args
            .empathy_map
            .get("person_name")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let notes = serde_json::to_string_pretty(&args.empathy_map)
            .map_err(|e| ToolError::invalid(self.name(), e.to_string()))?;

        let ctx = SynthesisContext {
            person,
            goal: Some(args.conversation_goal.clone()),
            notes: Some(notes),
            ..SynthesisContext::default()
        };
        let artifact = self
            .synthesizer
            .synthesize_with(&[], ArtifactKind::StrategicBrief, &ctx)
            .await;

        Ok(ToolOutput::success(
            json!({
                "tool": self.name(),
                "strategy": {
                    "empathy_map_id": args.empathy_map.get("created_at"),
                    "conversation_goal": args.conversation_goal,
                    "strategy_guidance": artifact.insight,
                },
                "guidance": artifact.insight,
                "ready_for_conversation": artifact.insight.is_some(),
            }),
            start.elapsed(),
        ))
    }
}
