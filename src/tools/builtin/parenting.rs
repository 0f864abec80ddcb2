//! Parent support tools: a behavioral risk checklist and the daily empathy
//! gym.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::context::InvocationContext;
use crate::error::ToolError;
use crate::synthesis::Synthesizer;
use crate::tools::tool::{Tool, ToolOutput, parse_args};

const MIN_SEVERITY: u32 = 1;
const MAX_SEVERITY: u32 = 5;
const HIGH_RISK_SCORE: u32 = 8;
const MEDIUM_RISK_SCORE: u32 = 5;
/// Denominator shown with the score.
const SCORE_SCALE: u32 = 15;

const NEXT_STEPS: [&str; 4] = [
    "Continue regular check-ins",
    "Maintain supportive presence",
    "Document any changes",
    "Trust your parental instincts",
];

const WHEN_TO_SEEK_HELP: [&str; 4] = [
    "Behaviors persist or worsen",
    "Multiple concerning signs appear",
    "Your intuition says something's wrong",
    "Child expresses thoughts of self-harm",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Band a risk score.
    pub fn from_score(score: u32) -> Self {
        if score >= HIGH_RISK_SCORE {
            Self::High
        } else if score >= MEDIUM_RISK_SCORE {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            Self::High => "Consider professional consultation soon",
            Self::Medium => "Monitor closely and maintain open communication",
            Self::Low => "Appears within normal teenage development range",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
enum BehaviorDuration {
    #[serde(rename = "less_than_week")]
    LessThanWeek,
    #[serde(rename = "1-2_weeks")]
    OneToTwoWeeks,
    #[serde(rename = "2-4_weeks")]
    TwoToFourWeeks,
    #[serde(rename = "1-3_months")]
    OneToThreeMonths,
    #[serde(rename = "more_than_3_months")]
    MoreThanThreeMonths,
}

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    behaviors: Vec<String>,
    duration: BehaviorDuration,
    severity: u32,
    #[serde(default)]
    context: Option<String>,
}

/// Score = observed behaviors + perceived severity. Blank entries are not
/// counted.
pub fn risk_score(behaviors: &[String], severity: u32) -> u32 {
    let observed = behaviors.iter().filter(|b| !b.trim().is_empty()).count();
    u32::try_from(observed).unwrap_or(u32::MAX).saturating_add(severity)
}

/// Checklist that separates ordinary teenage behavior from warning signs.
/// Deterministic; no external calls.
pub struct BehavioralWeatherTool;

#[async_trait]
impl Tool for BehavioralWeatherTool {
    fn name(&self) -> &str {
        "behavioral_weather_report"
    }

    fn description(&self) -> &str {
        "Educational checklist helping parents distinguish normal behavior from warning signs"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "behaviors": {
                    "type": "array",
                    "description": "Observed behaviors",
                    "items": {"type": "string"}
                },
                "duration": {
                    "type": "string",
                    "description": "How long the behaviors have lasted",
                    "enum": ["less_than_week", "1-2_weeks", "2-4_weeks", "1-3_months", "more_than_3_months"]
                },
                "severity": {
                    "type": "integer",
                    "description": "Concern level (1-5)",
                    "minimum": MIN_SEVERITY,
                    "maximum": MAX_SEVERITY
                },
                "context": {"type": "string", "description": "Additional context"}
            },
            "required": ["behaviors", "duration", "severity"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: WeatherArgs = parse_args(self.name(), params)?;
        if !(MIN_SEVERITY..=MAX_SEVERITY).contains(&args.severity) {
            return Err(ToolError::invalid(
                self.name(),
                format!("severity must be between {MIN_SEVERITY} and {MAX_SEVERITY}"),
            ));
        }

        let score = risk_score(&args.behaviors, args.severity);
        let level = RiskLevel::from_score(score);
        debug!(score, level = ?level, "Behavior report scored");

        Ok(ToolOutput::success(
            json!({
                "tool": self.name(),
                "assessment": {
                    "risk_level": level,
                    "risk_score": format!("{score}/{SCORE_SCALE}"),
                    "recommendation": level.recommendation(),
                    "behaviors_analyzed": args.behaviors.iter().filter(|b| !b.trim().is_empty()).count(),
                    "duration": args.duration,
                    "severity_perception": format!("{}/{MAX_SEVERITY}", args.severity),
                    "context": args.context,
                },
                "guidance": {
                    "next_steps": NEXT_STEPS,
                    "when_to_seek_help": WHEN_TO_SEEK_HELP,
                },
            }),
            start.elapsed(),
        ))
    }
}

const GYM_SYSTEM: &str =
    "You are a warm parenting coach. In two sentences, reflect the teenager's likely feelings and affirm one thing the parent did well.";
const GYM_FALLBACK: &str =
    "Great work practicing empathy! Consider your teenager's emotional needs behind their behavior.";
const GYM_ENCOURAGEMENT: &str = "Every moment of understanding strengthens your relationship.";
const GYM_INSTRUCTION: &str = "Take 60 seconds to think from your teenager's perspective, then respond.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Serialize)]
pub struct GymScenario {
    pub id: &'static str,
    pub difficulty: Difficulty,
    pub situation: &'static str,
    pub context: &'static str,
    pub prompt: &'static str,
}

pub static GYM_SCENARIOS: &[GymScenario] = &[
    GymScenario {
        id: "teen_room_mess",
        difficulty: Difficulty::Beginner,
        situation: "Your teenager's room is completely messy. They're on their bed scrolling their phone.",
        context: "They have a big test tomorrow and you've reminded them twice to clean up.",
        prompt: "What's your immediate response?",
    },
    GymScenario {
        id: "late_reply",
        difficulty: Difficulty::Beginner,
        situation: "Your teenager comes home an hour late and didn't answer your texts.",
        context: "They look upset and head straight for their room.",
        prompt: "What do you say before they close the door?",
    },
    GymScenario {
        id: "quit_the_team",
        difficulty: Difficulty::Intermediate,
        situation: "Your son says he wants to quit the football team mid-season.",
        context: "You paid for the season and he used to love it. He won't say why.",
        prompt: "How do you open the conversation?",
    },
    GymScenario {
        id: "friend_you_distrust",
        difficulty: Difficulty::Intermediate,
        situation: "Your daughter wants to spend the weekend at a friend's house you don't trust.",
        context: "Last time she came back withdrawn, and she says you never let her do anything.",
        prompt: "What's your response?",
    },
    GymScenario {
        id: "i_hate_you",
        difficulty: Difficulty::Advanced,
        situation: "In the middle of an argument about screen time, your teenager yells that they hate you.",
        context: "Siblings are watching, and you feel your own anger rising.",
        prompt: "What do you do in the next ten seconds?",
    },
];

/// Today's scenario for a difficulty. Rotates by calendar day.
pub fn daily_scenario(difficulty: Difficulty, day: u32) -> Option<&'static GymScenario> {
    let pool: Vec<&GymScenario> = GYM_SCENARIOS.iter().filter(|s| s.difficulty == difficulty).collect();
    if pool.is_empty() {
        return None;
    }
    pool.get(day as usize % pool.len()).copied()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum GymAction {
    GetDaily,
    SubmitResponse,
}

#[derive(Debug, Deserialize)]
struct GymArgs {
    action: GymAction,
    #[serde(default)]
    difficulty: Difficulty,
    #[serde(default)]
    scenario_id: Option<String>,
    #[serde(default)]
    user_response: Option<String>,
}

/// Daily 60-second parenting scenarios with feedback on the parent's reply.
pub struct EmpathyGymTool {
    synthesizer: Arc<Synthesizer>,
}

impl EmpathyGymTool {
    pub fn new(synthesizer: Arc<Synthesizer>) -> Self {
        Self { synthesizer }
    }

    fn present(&self, difficulty: Difficulty) -> Result<Value, ToolError> {
        let scenario = daily_scenario(difficulty, Utc::now().ordinal0())
            .ok_or_else(|| ToolError::invalid(self.name(), format!("no scenarios for {difficulty:?}")))?;
        Ok(json!({
            "tool": self.name(),
            "action": "scenario_presented",
            "scenario": scenario,
            "difficulty": difficulty,
            "timer_seconds": 60,
            "instruction": GYM_INSTRUCTION,
        }))
    }

    async fn respond(&self, scenario_id: Option<String>, reply: Option<String>) -> Result<Value, ToolError> {
        let id = scenario_id.unwrap_or_default();
        let scenario = GYM_SCENARIOS
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| ToolError::invalid(self.name(), format!("unknown scenario '{id}'")))?;
        let reply = reply
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ToolError::invalid(self.name(), "missing 'user_response' parameter"))?;

        let prompt = format!(
            "Situation: {}\nContext: {}\nParent's response: {reply}",
            scenario.situation, scenario.context
        );
        let feedback = self.synthesizer.narrate(GYM_SYSTEM, prompt, 120).await;

        Ok(json!({
            "tool": self.name(),
            "action": "feedback_provided",
            "scenario_id": scenario.id,
            "feedback": feedback.unwrap_or_else(|| GYM_FALLBACK.to_string()),
            "encouragement": GYM_ENCOURAGEMENT,
        }))
    }
}

#[async_trait]
impl Tool for EmpathyGymTool {
    fn name(&self) -> &str {
        "empathy_gym"
    }

    fn description(&self) -> &str {
        "Daily 60-second parenting scenarios with immediate feedback to build empathy skills"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {"type": "string", "enum": ["get_daily", "submit_response"]},
                "difficulty": {
                    "type": "string",
                    "enum": ["beginner", "intermediate", "advanced"],
                    "default": "beginner"
                },
                "scenario_id": {"type": "string", "description": "Scenario being answered, for submit_response"},
                "user_response": {"type": "string", "description": "Parent's response to the scenario"}
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: GymArgs = parse_args(self.name(), params)?;
        let result = match args.action {
            GymAction::GetDaily => self.present(args.difficulty)?,
            GymAction::SubmitResponse => self.respond(args.scenario_id, args.user_response).await?,
        };
        Ok(ToolOutput::success(result, start.elapsed()))
    }
}
