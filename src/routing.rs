//! Trigger routing: an ordered rule table mapping free text to the tool
//! that should handle it.
//!
//! Rules are evaluated top to bottom and the first match wins:
//! - crisis language → `sos_triage`
//! - hard conversations with someone → `empathy_map_setup`
//! - lost motivation or direction → `future_self_input`
//! - social skills and boundaries → `dialogue_gym_scenarios`
//! - decisions and dilemmas → `values_discovery_expedition`
//!
//! No match means no suggestion; the caller decides what to do.

use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// One routing rule with a compiled regex.
#[derive(Debug, Clone)]
pub struct TriggerRule {
    /// Short rule name, reported with each match.
    pub name: String,
    pub regex: Regex,
    /// Tool to route to.
    pub target: String,
}

/// The rule that fired for a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteMatch {
    pub rule: String,
    pub target: String,
}

/// Ordered trigger table.
#[derive(Debug, Clone, Default)]
pub struct TriggerRouter {
    rules: Vec<TriggerRule>,
}

impl TriggerRouter {
    /// The built-in table. Crisis rules come first so they can never be
    /// shadowed by a softer match.
    pub fn default_rules() -> Result<Self, regex::Error> {
        let mut router = Self::empty();
        router.add_rule(
            "crisis",
            r"(?i)\b(kill myself|hurt myself|suicid\w*|end my life|can'?t breathe|heart (is )?racing|panic attack|want to die|hopeless|can'?t take it|overwhelm\w*|breaking down|falling apart|can'?t cope)\b",
            "sos_triage",
        )?;
        router.add_rule(
            "hard_conversation",
            r"(?i)\b(talk to my|tell my (parents|mom|dad)|difficult conversation|family (conflict|pressure)|convince someone|they don'?t understand|communicate with|relationship problem)",
            "empathy_map_setup",
        )?;
        router.add_rule(
            "lost_motivation",
            r"(?i)\b(no motivation|lost motivation|don'?t see the point|what'?s the point|future feels hopeless|can'?t see myself|no direction|stuck in life|dreams feel impossible|goals seem unrealistic|losing hope|giving up|don'?t know where i'?m going|future looks bleak|no purpose)",
            "future_self_input",
        )?;
        router.add_rule(
            "social_skills",
            r"(?i)\b(social anxiety|can'?t talk to people|awkward conversations|don'?t know what to say|scared to ask|afraid to speak up|conversation skills|social skills|trouble communicating|hard to talk|social situations|shy around people|can'?t say no|bad at boundaries|people pleas\w*|avoid conflict)",
            "dialogue_gym_scenarios",
        )?;
        router.add_rule(
            "decision",
            r"(?i)\b(should i|is it (okay|right) to|what should i do|follow my passion|which path|what career|(life|big) decision|family expects|pressure to|supposed to|right thing to do|secure or risky|follow (my )?dreams|quit my job|leave a job|change careers?)\b",
            "values_discovery_expedition",
        )?;
        Ok(router)
    }

    /// A table with no rules.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule; it is evaluated after every existing rule.
    pub fn add_rule(&mut self, name: &str, pattern: &str, target: &str) -> Result<(), regex::Error> {
        self.rules.push(TriggerRule {
            name: name.to_string(),
            regex: Regex::new(pattern)?,
            target: target.to_string(),
        });
        Ok(())
    }

    pub fn rules(&self) -> &[TriggerRule] {
        &self.rules
    }

    /// First matching rule, if any.
    pub fn route(&self, text: &str) -> Option<RouteMatch> {
        let rule = self.rules.iter().find(|r| r.regex.is_match(text))?;
        debug!(rule = %rule.name, target = %rule.target, "Trigger rule matched");
        Some(RouteMatch {
            rule: rule.name.clone(),
            target: rule.target.clone(),
        })
    }
}
