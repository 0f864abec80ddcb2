//! Dialogue gym: practice zones, role-play scenarios, and the prompts used
//! for persona replies, coaching, and post-session analysis.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Scenario {
    pub id: &'static str,
    pub title: &'static str,
    pub situation: &'static str,
    pub goal: &'static str,
    pub difficulty: &'static str,
    pub persona_prompt: &'static str,
    pub opening_line: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Zone {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub scenarios: &'static [Scenario],
}

pub const ZONES: &[Zone] = &[
    Zone {
        id: "assertiveness",
        name: "Assertiveness Zone",
        description: "Practice setting boundaries and saying 'no' confidently",
        scenarios: &[
            Scenario {
                id: "assert_1",
                title: "Friend Wants to Borrow Money",
                situation: "Your friend asks to borrow $200 that you're not comfortable lending",
                goal: "Decline the request firmly but kindly, preserving the friendship",
                difficulty: "Medium",
                persona_prompt: "You are Alex, a close friend who is stressed about finances. You need $200 urgently and hope your friend will help. Be friendly but persistent. Express disappointment if they refuse, but don't get angry.",
                opening_line: "Hey! I'm in a really tight spot right now. Could you possibly lend me $200? I promise I'll pay you back next month.",
            },
            Scenario {
                id: "assert_2",
                title: "Family Member's Critical Comment",
                situation: "Your family member makes a critical comment about your life choices",
                goal: "Address the criticism while maintaining respect and setting a boundary",
                difficulty: "Hard",
                persona_prompt: "You are a concerned family member who thinks the user is making poor life choices. You care about them but tend to be critical. Defend your position if challenged.",
                opening_line: "I just don't understand why you're wasting your potential on this path. You could be doing so much better.",
            },
        ],
    },
    Zone {
        id: "reaching_out",
        name: "Reaching Out Zone",
        description: "Practice asking for help and support",
        scenarios: &[Scenario {
            id: "reach_1",
            title: "Ask Professor for Extension",
            situation: "You need to email your professor for a deadline extension due to personal reasons",
            goal: "Request extension professionally while providing appropriate context",
            difficulty: "Medium",
            persona_prompt: "You are Professor Johnson, an understanding but busy academic. You want to help students but need clear, concise requests. You appreciate honesty and professionalism.",
            opening_line: "Hello, I received your email about needing an extension. Can you tell me more about your situation?",
        }],
    },
    Zone {
        id: "social_connection",
        name: "Social Connection Zone",
        description: "Practice building friendships and social skills",
        scenarios: &[Scenario {
            id: "social_1",
            title: "Small Talk with Classmate",
            situation: "Making conversation with a new classmate before lecture begins",
            goal: "Create a friendly connection and find common ground",
            difficulty: "Easy",
            persona_prompt: "You are Jamie, a friendly classmate who is open to chatting but not overly talkative. Respond naturally to conversation attempts.",
            opening_line: "Oh hey, you're in my statistics class too, right? How are you finding it so far?",
        }],
    },
    Zone {
        id: "heart_to_heart",
        name: "Heart-to-Heart Zone",
        description: "Practice vulnerable and significant conversations",
        scenarios: &[Scenario {
            id: "heart_1",
            title: "Mental Health Disclosure",
            situation: "Telling a close friend about your mental health struggles",
            goal: "Share vulnerably while asking for appropriate support",
            difficulty: "Hard",
            persona_prompt: "You are Sam, a caring friend who wants to be supportive but isn't sure how to respond to mental health topics. Be empathetic but realistic.",
            opening_line: "You seem to have something on your mind lately. Is everything okay?",
        }],
    },
];

/// Persona replies see at most this many earlier turns.
pub const PERSONA_CONTEXT_TURNS: usize = 3;

pub const PERSONA_FALLBACK: &str = "Hmm, give me a second to think about that. Can you say a bit more?";
pub const COACH_FALLBACK: &str = "Try: name what you need in one clear I-statement.";
pub const ANALYSIS_FALLBACK: &str = "Nice work finishing this practice round. Look back at one moment where you stated your goal clearly, and one where you could try an I-statement next time.";

pub fn zone(id: &str) -> Option<&'static Zone> {
    ZONES.iter().find(|z| z.id == id)
}

pub fn find_scenario(id: &str) -> Option<&'static Scenario> {
    ZONES
        .iter()
        .flat_map(|z| z.scenarios.iter())
        .find(|s| s.id == id)
}

/// One turn of a practice conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: String,
    pub message: String,
}

fn render_turns(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.speaker, t.message))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn persona_prompt(scenario: &Scenario, history: &[Turn], user_message: &str) -> String {
    let recent = &history[history.len().saturating_sub(PERSONA_CONTEXT_TURNS)..];
    let so_far = if recent.is_empty() {
        "This is the start".to_string()
    } else {
        render_turns(recent)
    };
    format!(
        "{}\n\nScenario: {}\n\nConversation so far:\n{}\n\n\
         The user just said: \"{}\"\n\n\
         Respond as your character would, keeping the conversation realistic and engaging. \
         Don't break character. Keep responses to 1-2 sentences.",
        scenario.persona_prompt, scenario.situation, so_far, user_message,
    )
}

pub fn coach_prompt(goal: &str, persona_message: &str, user_message: &str) -> String {
    format!(
        "You are an expert communication coach. Analyze this response:\n\n\
         GOAL: {goal}\n\
         CONTEXT: The other person said: \"{persona_message}\"\n\
         USER RESPONSE: \"{user_message}\"\n\n\
         Provide ONE sentence of concise, actionable feedback. Focus on how well they're meeting \
         the goal and on specific communication techniques (I-statements, empathy, clarity).\n\n\
         Start with \"Good!\" or \"Try:\" and keep it under 20 words."
    )
}

pub fn analysis_prompt(scenario: &Scenario, history: &[Turn], coach_feedback: &[String]) -> String {
    format!(
        "Analyze this dialogue practice session:\n\n\
         SCENARIO: {} - {}\n\
         CONVERSATION:\n{}\n\
         COACH FEEDBACK: {}\n\n\
         Provide:\n\
         1. Performance ratings (1-5 stars) for: Clarity, Empathy, Goal Achievement\n\
         2. Key strengths (what they did well)\n\
         3. Growth areas (what to improve)\n\
         4. One specific alternative phrase they could have used\n\n\
         Keep it encouraging and actionable.",
        scenario.title,
        scenario.goal,
        render_turns(history),
        coach_feedback.join(" | "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(speaker: &str, message: &str) -> Turn {
        Turn {
            speaker: speaker.into(),
            message: message.into(),
        }
    }

    #[test]
    fn scenario_ids_are_unique() {
        let mut ids: Vec<&str> = ZONES
            .iter()
            .flat_map(|z| z.scenarios.iter().map(|s| s.id))
            .collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
        assert_eq!(total, 5);
    }

    #[test]
    fn lookup() {
        assert_eq!(find_scenario("reach_1").unwrap().title, "Ask Professor for Extension");
        assert!(find_scenario("reach_9").is_none());
        assert_eq!(zone("assertiveness").unwrap().scenarios.len(), 2);
    }

    #[test]
    fn persona_prompt_keeps_last_three_turns() {
        let history = vec![
            turn("persona", "first"),
            turn("user", "second"),
            turn("persona", "third"),
            turn("user", "fourth"),
        ];
        let scenario = find_scenario("social_1").unwrap();
        let prompt = persona_prompt(scenario, &history, "hello");
        assert!(!prompt.contains("first"));
        assert!(prompt.contains("fourth"));
        assert!(prompt.contains("You are Jamie"));
    }

    #[test]
    fn persona_prompt_at_start() {
        let prompt = persona_prompt(find_scenario("heart_1").unwrap(), &[], "hi");
        assert!(prompt.contains("This is the start"));
    }
}
