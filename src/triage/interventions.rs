//! Static intervention payloads. No external calls.

use serde::Deserialize;
use serde_json::{Value, json};

/// Seconds in one box-breathing cycle (four 4-second phases).
const BOX_CYCLE_SECS: u64 = 16;

pub const DEFAULT_BREATHING_SECS: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationSpeed {
    #[default]
    Slow,
    Medium,
    Fast,
}

impl AnimationSpeed {
    fn as_str(self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Medium => "medium",
            Self::Fast => "fast",
        }
    }

    /// (rotation seconds, description)
    fn setting(self) -> (u64, &'static str) {
        match self {
            Self::Slow => (30, "Very slow, hypnotic movement"),
            Self::Medium => (20, "Moderate, steady rhythm"),
            Self::Fast => (10, "Dynamic, engaging motion"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Soundscape {
    #[default]
    Rain,
    Forest,
    Ocean,
    Fireplace,
}

impl Soundscape {
    fn as_str(self) -> &'static str {
        match self {
            Self::Rain => "rain",
            Self::Forest => "forest",
            Self::Ocean => "ocean",
            Self::Fireplace => "fireplace",
        }
    }

    fn describe(self) -> Value {
        let (name, description, visual_theme, mood) = match self {
            Self::Rain => (
                "Gentle Rain",
                "Soft rain on a window with occasional thunder in the distance",
                "water_droplets_on_glass",
                "peaceful_and_cleansing",
            ),
            Self::Forest => (
                "Peaceful Forest",
                "Gentle wind through trees with distant bird songs",
                "swaying_green_trees",
                "grounded_and_natural",
            ),
            Self::Ocean => (
                "Calm Ocean Waves",
                "Gentle waves washing onto a peaceful shore",
                "rhythmic_blue_waves",
                "vast_and_soothing",
            ),
            Self::Fireplace => (
                "Cozy Fireplace",
                "Gentle crackling fire with warm, dancing flames",
                "warm_orange_flames",
                "safe_and_comforting",
            ),
        };
        json!({
            "name": name,
            "description": description,
            "visual_theme": visual_theme,
            "mood": mood,
        })
    }
}

/// Number of full breathing cycles in `duration_secs`, at least one.
pub fn breathing_cycles(duration_secs: u64) -> u64 {
    (duration_secs / BOX_CYCLE_SECS).max(1)
}

pub fn box_breathing(duration_secs: u64) -> Value {
    json!({
        "tool": "box_breathing",
        "intervention": {
            "name": "Interactive Box Breathing",
            "type": "breathing_visual",
            "description": "Visual guide to regulate nervous system and reduce heart rate",
            "duration_seconds": duration_secs,
            "total_cycles": breathing_cycles(duration_secs),
            "instructions": "Follow the expanding circle as it guides your breathing",
            "breathing_pattern": [
                {"phase": "inhale", "duration": 4, "instruction": "Breathe in slowly", "visual_cue": "expand"},
                {"phase": "hold_in", "duration": 4, "instruction": "Hold your breath", "visual_cue": "pause_expanded"},
                {"phase": "exhale", "duration": 4, "instruction": "Breathe out slowly", "visual_cue": "contract"},
                {"phase": "hold_out", "duration": 4, "instruction": "Hold empty", "visual_cue": "pause_contracted"}
            ],
            "completion_message": "Excellent work! Notice how much calmer you feel now."
        }
    })
}

pub fn visual_focus(speed: AnimationSpeed) -> Value {
    let (rotation, description) = speed.setting();
    json!({
        "tool": "visual_focus",
        "intervention": {
            "name": "Calming Visual Focus",
            "type": "visual_meditation",
            "description": "Mesmerizing animation to interrupt racing thoughts",
            "duration_seconds": 120,
            "animation": {
                "type": "spiral_particles",
                "speed": speed.as_str(),
                "rotation_duration": rotation,
                "color_scheme": "calming_gradient",
                "description": description
            },
            "instructions": "Focus on the center of the animation. Let your thoughts follow the gentle movement.",
            "guidance": [
                "Don't try to stop your thoughts",
                "Just watch the movement",
                "Let your mind become curious about the patterns",
                "Breathe naturally as you watch"
            ]
        }
    })
}

pub fn grounding_543() -> Value {
    let senses: [(&str, u8, &str, &[&str], &str); 5] = [
        (
            "sight",
            5,
            "Look around and name 5 things you can see",
            &["the wall color", "your hands", "a door", "the ceiling", "shadows"],
            "Take your time. Really notice the details.",
        ),
        (
            "touch",
            4,
            "Find and touch 4 different textures",
            &["your clothing", "a smooth surface", "your hair", "something rough"],
            "Notice the temperature, texture, and weight.",
        ),
        (
            "hearing",
            3,
            "Listen carefully for 3 distinct sounds",
            &["your breathing", "distant traffic", "air conditioning", "footsteps"],
            "Close your eyes if it helps you focus on sounds.",
        ),
        (
            "smell",
            2,
            "Notice 2 different scents in your environment",
            &["the air", "soap", "food", "your clothes"],
            "Take gentle breaths in through your nose.",
        ),
        (
            "taste",
            1,
            "Focus on 1 taste you can detect",
            &["toothpaste", "coffee", "gum", "neutral saliva"],
            "This might be subtle, and that's completely normal.",
        ),
    ];

    let steps: Vec<Value> = senses
        .iter()
        .enumerate()
        .map(|(i, (sense, count, instruction, examples, guidance))| {
            json!({
                "step": i + 1,
                "sense": sense,
                "count": count,
                "instruction": instruction,
                "examples": examples,
                "guidance": guidance,
            })
        })
        .collect();

    json!({
        "tool": "grounding_543",
        "intervention": {
            "name": "5-4-3-2-1 Grounding Exercise",
            "type": "sensory_grounding",
            "description": "Reconnect with your physical environment through your senses",
            "estimated_duration": 300,
            "steps": steps,
            "completion_message": "Perfect! You are here, in this moment, in this place. You are present and safe.",
            "follow_up": "Take a moment to notice how you feel compared to when you started."
        }
    })
}

pub fn muscle_relaxation() -> Value {
    let groups = [
        (
            "hands_and_forearms",
            "Make tight fists and tense your forearms",
            "Open your hands and let your arms fall completely loose",
            "Notice the contrast between tension and relaxation",
        ),
        (
            "upper_arms_and_shoulders",
            "Pull your arms tight against your body and lift your shoulders to your ears",
            "Let your arms drop heavy and your shoulders fall down",
            "Feel the weight of your arms as they relax",
        ),
        (
            "face_and_head",
            "Scrunch your face tight: close eyes, clench jaw, furrow brow",
            "Let your entire face go soft and smooth",
            "Allow your jaw to drop slightly open",
        ),
        (
            "neck_and_throat",
            "Gently tense your neck muscles",
            "Let your neck relax completely",
            "Feel your head settle comfortably",
        ),
        (
            "chest_and_back",
            "Arch your back slightly and expand your chest",
            "Let your chest fall and your back settle naturally",
            "Notice your breathing becoming deeper",
        ),
        (
            "legs_and_feet",
            "Straighten your legs, point your toes, tense your thighs",
            "Let your legs become completely heavy and loose",
            "Feel your legs sinking into relaxation",
        ),
    ];

    let muscle_groups: Vec<Value> = groups
        .iter()
        .map(|(name, tense, release, focus)| {
            json!({
                "name": name,
                "tension_instruction": tense,
                "release_instruction": release,
                "focus": focus,
            })
        })
        .collect();

    json!({
        "tool": "muscle_relaxation",
        "intervention": {
            "name": "Guided Progressive Muscle Relaxation",
            "type": "physical_release",
            "description": "Release physical tension through systematic muscle tension and release",
            "estimated_duration": 240,
            "instructions": "Tense each muscle group for 5 seconds, then completely release and notice the relaxation",
            "muscle_groups": muscle_groups,
            "completion_message": "Excellent work. Your body has released significant tension. Take a moment to appreciate how much calmer you feel.",
            "final_instruction": "Sit quietly for another minute and enjoy this relaxed state."
        }
    })
}

pub fn emergency_soundscape(kind: Soundscape) -> Value {
    let soundscape = kind.describe();
    json!({
        "tool": "emergency_soundscape",
        "intervention": {
            "name": format!("Emergency Comfort: {}", soundscape["name"].as_str().unwrap_or_default()),
            "type": "immersive_comfort",
            "description": "A safe, comforting sensory experience that requires no effort from you",
            "duration_seconds": 300,
            "visual_component": {
                "type": soundscape["visual_theme"],
                "description": format!("Gentle visual that matches the {} sounds", kind.as_str()),
                "auto_dim": true
            },
            "soundscape": soundscape,
            "primary_message": "You are safe. This feeling will pass. You are not alone.",
            "secondary_messages": [
                "You don't need to do anything right now except breathe",
                "It's okay to just exist in this moment",
                "You have survived difficult moments before",
                "This is a safe space for you to simply be"
            ],
            "instructions": "Just breathe and let the sounds wash over you. There's nothing you need to fix or figure out right now."
        }
    })
}
