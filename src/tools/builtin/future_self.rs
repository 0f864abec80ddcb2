//! Future self tools: narrative generation, the experience package, and
//! the present-day commitment.

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
use crate::synthesis::{ArtifactKind, Synthesizer, prompts};
use crate::tools::tool::{Tool, ToolOutput, parse_args, require_str};

const INTEGRATION_FALLBACK: &str = "Start small: do your commitment once this week at the same time of day, and notice how it feels to act like your future self.";

fn answer<'a>(history: &'a [ResponseRecord], stage: &str) -> &'a str {
    history
        .iter()
        .find(|r| r.stage == stage)
        .and_then(|r| r.text.as_deref())
        .unwrap_or("")
}

/// Prompt for an image of the imagined environment.
pub fn image_prompt(environment: &str, feelings: &str) -> String {
    format!(
        "cinematic photo, {environment}. The mood is {feelings}. High detail, photorealistic, inspiring atmosphere, natural lighting."
    )
}

#[derive(Debug, Deserialize)]
struct GenerationArgs {
    responses: Vec<ResponseRecord>,
}

/// Writes the day-in-the-life story from the five future self answers.
pub struct FutureSelfGenerationTool {
    synthesizer: Arc<Synthesizer>,
    events: EventLog,
}

impl FutureSelfGenerationTool {
    pub fn new(synthesizer: Arc<Synthesizer>, events: EventLog) -> Self {
        Self {
            synthesizer,
            events,
        }
    }
}

#[async_trait]
impl Tool for FutureSelfGenerationTool {
    fn name(&self) -> &str {
        "future_self_generation"
    }

    fn description(&self) -> &str {
        "Generate a day-in-the-life story and image prompt from future self answers"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "responses": {"type": "array", "description": "Responses from future_self_input"}
            },
            "required": ["responses"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: GenerationArgs = parse_args(self.name(), params)?;
        let history = &args.responses;

        let artifact = self
            .synthesizer
            .synthesize(history, ArtifactKind::FutureNarrative)
            .await;

        let simulation = json!({
            "identity": answer(history, "identity"),
            "environment": answer(history, "environment"),
            "feelings": answer(history, "feeling"),
            "rituals": answer(history, "rituals"),
            "skill": answer(history, "accomplishment"),
            "generated_story": artifact.insight,
            "image_prompt": image_prompt(answer(history, "environment"), answer(history, "feeling")),
            "created_at": Utc::now().to_rfc3339(),
        });

        self.events.append_detached(
            ARTIFACTS,
            json!({"data_type": "future_simulation", "data": simulation.clone()}),
        );

        Ok(ToolOutput::success(
            json!({
                "tool": self.name(),
                "simulation": simulation,
                "ready_for_experience": artifact.insight.is_some(),
                "message": "Your future self simulation has been created! Ready to experience your day in the life.",
            }),
            start.elapsed(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ExperienceArgs {
    simulation: serde_json::Map<String, Value>,
}

/// Packages a generated simulation for presentation. No external calls.
pub struct FutureSelfExperienceTool;

#[async_trait]
impl Tool for FutureSelfExperienceTool {
    fn name(&self) -> &str {
        "future_self_experience"
    }

    fn description(&self) -> &str {
        "Present a generated future self simulation as an immersive experience"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "simulation": {"type": "object", "description": "Simulation returned by future_self_generation"}
            },
            "required": ["simulation"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: ExperienceArgs = parse_args(self.name(), params)?;
        let sim = &args.simulation;
        let story = sim.get("generated_story").filter(|v| v.is_string());

        Ok(ToolOutput::success(
            json!({
                "tool": self.name(),
                "experience": {
                    "simulation_id": sim.get("created_at"),
                    "immersive_story": story,
                    "visual_description": sim.get("image_prompt"),
                    "identity_summary": sim.get("identity"),
                    "experience_ready": story.is_some(),
                },
                "message": "Welcome to your future. Take your time experiencing this day in your life.",
                "next_step": "future_self_integration",
            }),
            start.elapsed(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct IntegrationArgs {
    identity_summary: String,
    commitment: String,
}

/// Connects the future vision to one present-day commitment.
pub struct FutureSelfIntegrationTool {
    synthesizer: Arc<Synthesizer>,
    events: EventLog,
}

impl FutureSelfIntegrationTool {
    pub fn new(synthesizer: Arc<Synthesizer>, events: EventLog) -> Self {
        Self {
            synthesizer,
            events,
        }
    }
}

#[async_trait]
impl Tool for FutureSelfIntegrationTool {
    fn name(&self) -> &str {
        "future_self_integration"
    }

    fn description(&self) -> &str {
        "Turn a future self vision into a first concrete step"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "identity_summary": {"type": "string", "description": "Who the user becomes in the vision"},
                "commitment": {"type": "string", "description": "One action the user commits to"}
            },
            "required": ["identity_summary", "commitment"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        require_str(self.name(), &params, "commitment")?;
        let args: IntegrationArgs = parse_args(self.name(), params)?;

        let guidance = self
            .synthesizer
            .narrate(
                prompts::system_prompt(ArtifactKind::FutureNarrative),
                prompts::integration_prompt(&args.identity_summary, &args.commitment),
                400,
            )
            .await;

        let integration = json!({
            "identity_summary": args.identity_summary,
            "user_commitment": args.commitment,
            "ai_guidance": guidance,
            "created_at": Utc::now().to_rfc3339(),
        });
        self.events.append_detached(
            ARTIFACTS,
            json!({"data_type": "future_integration", "data": integration.clone()}),
        );

        Ok(ToolOutput::success(
            json!({
                "tool": self.name(),
                "integration": integration,
                "guidance_available": guidance.is_some(),
                "guidance": guidance.unwrap_or_else(|| INTEGRATION_FALLBACK.to_string()),
                "message": "Your future self simulation is complete! You now have a clear vision and your first step forward.",
            }),
            start.elapsed(),
        ))
    }
}
