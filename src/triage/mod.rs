//! Crisis triage: symptom and intervention vocabularies, the static triage
//! menu, and the classifier that maps free text onto them.

pub mod classifier;
pub mod interventions;

pub use classifier::{Assessment, CrisisClassifier, CrisisEvent, InputMetadata};

use std::fmt;

use serde::{Deserialize, Serialize};

/// The question asked by the static triage menu.
pub const TRIAGE_QUESTION: &str = "Right now, in this moment, what do you feel the most?";

/// Symptom categories the classifier chooses among.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    RacingThoughts,
    PhysicalPanic,
    Dissociation,
    Sadness,
    Tension,
    Numbness,
}

impl Symptom {
    pub const ALL: [Symptom; 6] = [
        Self::RacingThoughts,
        Self::PhysicalPanic,
        Self::Dissociation,
        Self::Sadness,
        Self::Tension,
        Self::Numbness,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RacingThoughts => "racing_thoughts",
            Self::PhysicalPanic => "physical_panic",
            Self::Dissociation => "dissociation",
            Self::Sadness => "sadness",
            Self::Tension => "tension",
            Self::Numbness => "numbness",
        }
    }

    /// Catalog intervention for this symptom. Sadness and numbness share
    /// the soundscape.
    pub fn intervention(self) -> Intervention {
        match self {
            Self::RacingThoughts => Intervention::VisualFocus,
            Self::PhysicalPanic => Intervention::BoxBreathing,
            Self::Dissociation => Intervention::Grounding543,
            Self::Sadness | Self::Numbness => Intervention::EmergencySoundscape,
            Self::Tension => Intervention::MuscleRelaxation,
        }
    }

    /// One-line description used in the classifier prompt.
    fn cue(self) -> &'static str {
        match self {
            Self::RacingThoughts => "Racing thoughts, can't stop thinking, mental overwhelm",
            Self::PhysicalPanic => "Heart pounding, can't breathe, physical panic symptoms",
            Self::Dissociation => "Feeling unreal, foggy, detached from reality",
            Self::Sadness => "Sudden heavy sadness, emptiness, depression wave",
            Self::Tension => "Body tense, restless, want to escape, agitation",
            Self::Numbness => "Feeling numb, frozen, shut down, disconnected",
        }
    }

    /// First-person menu text.
    fn menu_text(self) -> &'static str {
        match self {
            Self::RacingThoughts => "My thoughts are racing and I can't stop them.",
            Self::PhysicalPanic => "My heart is pounding and I can't breathe.",
            Self::Dissociation => "Everything feels unreal, like I'm in a fog.",
            Self::Sadness => "I feel a sudden, heavy wave of sadness or emptiness.",
            Self::Tension => "My body is tense, restless, and wants to escape.",
            Self::Numbness => "I just feel numb and frozen.",
        }
    }

    /// Lenient parse: case-insensitive, spaces and dashes read as `_`.
    pub fn parse(raw: &str) -> Option<Self> {
        let key = normalize(raw);
        Self::ALL.into_iter().find(|s| s.as_str() == key)
    }
}

impl fmt::Display for Symptom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The calming intervention catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intervention {
    VisualFocus,
    BoxBreathing,
    #[serde(rename = "grounding_543")]
    Grounding543,
    MuscleRelaxation,
    EmergencySoundscape,
}

impl Intervention {
    pub const ALL: [Intervention; 5] = [
        Self::VisualFocus,
        Self::BoxBreathing,
        Self::Grounding543,
        Self::MuscleRelaxation,
        Self::EmergencySoundscape,
    ];

    /// Also the name of the tool that serves this intervention.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VisualFocus => "visual_focus",
            Self::BoxBreathing => "box_breathing",
            Self::Grounding543 => "grounding_543",
            Self::MuscleRelaxation => "muscle_relaxation",
            Self::EmergencySoundscape => "emergency_soundscape",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let key = normalize(raw);
        Self::ALL.into_iter().find(|i| i.as_str() == key)
    }
}

impl fmt::Display for Intervention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .replace([' ', '-'], "_")
}

/// Result of a crisis classification.
///
/// `is_crisis == false` means no intervention is required even when one is
/// suggested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisClassification {
    pub is_crisis: bool,
    pub symptom_type: Symptom,
    /// Always within 0..=100.
    pub confidence: u8,
    pub suggested_tool: Intervention,
}

impl CrisisClassification {
    /// Used whenever the collaborator fails: err toward offering help.
    pub const FALLBACK: CrisisClassification = CrisisClassification {
        is_crisis: true,
        symptom_type: Symptom::PhysicalPanic,
        confidence: 50,
        suggested_tool: Intervention::BoxBreathing,
    };

    pub fn requires_intervention(&self) -> bool {
        self.is_crisis
    }
}

/// One entry of the static triage menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriageOption {
    pub category: Symptom,
    pub prompt_text: &'static str,
    pub recommended_tool: Intervention,
}

/// The static triage menu, in presentation order. No external calls.
pub fn triage_options() -> Vec<TriageOption> {
    Symptom::ALL
        .into_iter()
        .map(|s| TriageOption {
            category: s,
            prompt_text: s.menu_text(),
            recommended_tool: s.intervention(),
        })
        .collect()
}

/// Prompt lines listing the symptom vocabulary.
pub(crate) fn symptom_prompt_lines() -> String {
    Symptom::ALL
        .iter()
        .map(|s| format!("- {}: {}", s.as_str(), s.cue()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_order_and_mapping() {
        let options = triage_options();
        let pairs: Vec<(&str, &str)> = options
            .iter()
            .map(|o| (o.category.as_str(), o.recommended_tool.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("racing_thoughts", "visual_focus"),
                ("physical_panic", "box_breathing"),
                ("dissociation", "grounding_543"),
                ("sadness", "emergency_soundscape"),
                ("tension", "muscle_relaxation"),
                ("numbness", "emergency_soundscape"),
            ]
        );
    }

    #[test]
    fn sadness_and_numbness_share_soundscape() {
        assert_eq!(
            Symptom::Sadness.intervention(),
            Symptom::Numbness.intervention()
        );
    }

    #[test]
    fn lenient_parsing() {
        assert_eq!(Symptom::parse("Racing Thoughts"), Some(Symptom::RacingThoughts));
        assert_eq!(Symptom::parse("physical-panic"), Some(Symptom::PhysicalPanic));
        assert_eq!(Symptom::parse("anger"), None);
        assert_eq!(Intervention::parse("GROUNDING_543"), Some(Intervention::Grounding543));
    }

    #[test]
    fn serde_names_match_as_str() {
        for s in Symptom::ALL {
            assert_eq!(serde_json::to_value(s).unwrap(), s.as_str());
        }
        for i in Intervention::ALL {
            assert_eq!(serde_json::to_value(i).unwrap(), i.as_str());
        }
    }

    #[test]
    fn fallback_payload() {
        assert_eq!(
            serde_json::to_value(CrisisClassification::FALLBACK).unwrap(),
            serde_json::json!({
                "is_crisis": true,
                "symptom_type": "physical_panic",
                "confidence": 50,
                "suggested_tool": "box_breathing"
            })
        );
    }
}
