//! Crisis tools: classification, the static triage menu, and the five
//! calming interventions.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::context::InvocationContext;
use crate::error::ToolError;
use crate::tools::tool::{Tool, ToolOutput, parse_args};
use crate::triage::interventions::{self, AnimationSpeed, DEFAULT_BREATHING_SECS, Soundscape};
use crate::triage::{CrisisClassifier, Intervention, TRIAGE_QUESTION, triage_options};

#[derive(Debug, Deserialize)]
struct DetectionArgs {
    user_text: String,
}

/// Classifies free text into a symptom and a suggested intervention.
pub struct CrisisDetectionTool {
    classifier: Arc<CrisisClassifier>,
}

impl CrisisDetectionTool {
    pub fn new(classifier: Arc<CrisisClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl Tool for CrisisDetectionTool {
    fn name(&self) -> &str {
        "crisis_detection"
    }

    fn description(&self) -> &str {
        "Analyze user text for mental health crisis signs and classify symptoms"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_text": {
                    "type": "string",
                    "description": "User's text input to analyze for crisis indicators"
                }
            },
            "required": ["user_text"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: DetectionArgs = parse_args(self.name(), params)?;
        let assessment = self.classifier.assess(&args.user_text).await;
        let c = assessment.classification;

        Ok(ToolOutput::success(
            json!({
                "tool": self.name(),
                "is_crisis": c.is_crisis,
                "symptom_type": c.symptom_type,
                "confidence": c.confidence,
                "suggested_tool": c.suggested_tool,
                "requires_intervention": c.requires_intervention(),
                "fallback": assessment.fallback_reason.is_some(),
            }),
            start.elapsed(),
        ))
    }
}

/// Static S.O.S. menu. Makes no external calls.
pub struct SosTriageTool;

#[async_trait]
impl Tool for SosTriageTool {
    fn name(&self) -> &str {
        "sos_triage"
    }

    fn description(&self) -> &str {
        "Get S.O.S. triage options for immediate crisis intervention"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        Ok(ToolOutput::success(
            json!({
                "tool": self.name(),
                "question": TRIAGE_QUESTION,
                "options": triage_options(),
            }),
            start.elapsed(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct BreathingArgs {
    #[serde(default = "default_breathing_secs")]
    duration_seconds: u64,
}

fn default_breathing_secs() -> u64 {
    DEFAULT_BREATHING_SECS
}

#[derive(Debug, Default, Deserialize)]
struct VisualArgs {
    #[serde(default)]
    animation_speed: AnimationSpeed,
}

#[derive(Debug, Default, Deserialize)]
struct SoundscapeArgs {
    #[serde(default)]
    soundscape_type: Soundscape,
}

/// Serves one entry of the intervention catalog.
pub struct InterventionTool {
    kind: Intervention,
}

impl InterventionTool {
    pub fn new(kind: Intervention) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl Tool for InterventionTool {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn description(&self) -> &str {
        match self.kind {
            Intervention::BoxBreathing => "Interactive box breathing exercise for physical panic symptoms",
            Intervention::VisualFocus => "Calming visual meditation for racing thoughts",
            Intervention::Grounding543 => "5-4-3-2-1 sensory grounding exercise for dissociation",
            Intervention::MuscleRelaxation => "Guided progressive muscle relaxation for physical tension",
            Intervention::EmergencySoundscape => "Immersive comforting soundscape for emotional distress",
        }
    }

    fn parameters_schema(&self) -> Value {
        match self.kind {
            Intervention::BoxBreathing => json!({
                "type": "object",
                "properties": {
                    "duration_seconds": {
                        "type": "integer",
                        "description": "Duration of the breathing exercise in seconds",
                        "default": DEFAULT_BREATHING_SECS
                    }
                }
            }),
            Intervention::VisualFocus => json!({
                "type": "object",
                "properties": {
                    "animation_speed": {
                        "type": "string",
                        "description": "Speed of animation: slow, medium, or fast",
                        "enum": ["slow", "medium", "fast"],
                        "default": "slow"
                    }
                }
            }),
            Intervention::EmergencySoundscape => json!({
                "type": "object",
                "properties": {
                    "soundscape_type": {
                        "type": "string",
                        "description": "Type of soundscape",
                        "enum": ["rain", "forest", "ocean", "fireplace"],
                        "default": "rain"
                    }
                }
            }),
            Intervention::Grounding543 | Intervention::MuscleRelaxation => {
                json!({"type": "object", "properties": {}})
            }
        }
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let payload = match self.kind {
            Intervention::BoxBreathing => {
                let args: BreathingArgs = parse_args(self.name(), params)?;
                interventions::box_breathing(args.duration_seconds)
            }
            Intervention::VisualFocus => {
                let args: VisualArgs = parse_args(self.name(), params)?;
                interventions::visual_focus(args.animation_speed)
            }
            Intervention::Grounding543 => interventions::grounding_543(),
            Intervention::MuscleRelaxation => interventions::muscle_relaxation(),
            Intervention::EmergencySoundscape => {
                let args: SoundscapeArgs = parse_args(self.name(), params)?;
                interventions::emergency_soundscape(args.soundscape_type)
            }
        };
        Ok(ToolOutput::success(payload, start.elapsed()))
    }
}
