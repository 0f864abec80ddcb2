//! The guided flows served by this crate.

use serde_json::json;

use crate::flows::definition::{
    ChoiceOption, FlowDefinition, InputRule, StageSpec, TransitionRule,
};
use crate::synthesis::ArtifactKind;

pub const WALK_A_MILE: &str = "walk_a_mile";
pub const GENERATIONAL_ECHO: &str = "generational_echo";
pub const VALUES_DISCOVERY: &str = "values_discovery_expedition";
pub const EMPATHY_MAP_INQUIRY: &str = "empathy_map_inquiry";
pub const FUTURE_SELF_INPUT: &str = "future_self_input";

/// Every flow, in registration order.
pub fn all_flows() -> Vec<FlowDefinition> {
    vec![
        walk_a_mile(),
        generational_echo(),
        values_discovery_expedition(),
        empathy_map_inquiry(),
        future_self_input(),
    ]
}

struct CaseStudy {
    title: &'static str,
    context: &'static str,
    situation: &'static str,
    approach_a: (&'static str, &'static str),
    approach_b: (&'static str, &'static str),
}

const CASE_STUDIES: &[CaseStudy] = &[
    CaseStudy {
        title: "The Career Dream Conflict",
        context: "Your 17-year-old daughter announces she wants to drop pre-med to become a photographer. You've always planned for her to be a doctor.",
        situation: "She applied to art school without telling you and got accepted with a scholarship.",
        approach_a: (
            "Express concerns about financial stability and 'wasting' her academic gifts. Emphasize practical benefits of medicine.",
            "Likely creates defensive response, potential rebellion, damaged trust",
        ),
        approach_b: (
            "Ask her to walk you through her passion for photography and specific career vision. Show genuine curiosity.",
            "Builds trust, opens collaborative planning, increases understanding",
        ),
    },
    CaseStudy {
        title: "Social Media Concerns",
        context: "You discover concerning posts on your 15-year-old son's social media - dark humor, feeling 'invisible' at school.",
        situation: "When confronted, he says 'it's just memes' and shuts down completely.",
        approach_a: (
            "Take away phone immediately. Demand explanation for every post and why he's 'being negative.'",
            "Complete shutdown, loss of monitoring ability, increased secrecy",
        ),
        approach_b: (
            "Acknowledge concern because you care, then ask him to help you understand what's happening at school.",
            "Gradual opening up, maintained connection, opportunity for support",
        ),
    },
    CaseStudy {
        title: "Academic Pressure Crisis",
        context: "Your high-achieving 16-year-old suddenly gets C's and D's. Teachers report she seems distracted and tired.",
        situation: "She stays up until 2 AM trying to maintain perfection in everything.",
        approach_a: (
            "Create structured study schedule, remove 'distractions' until grades improve.",
            "Increased pressure, potential burnout, damaged self-worth",
        ),
        approach_b: (
            "Acknowledge her hard work, then explore together what success and balance could look like.",
            "Relief, honest conversation about pressure, healthier expectations",
        ),
    },
];

/// Three branching parenting case studies.
pub fn walk_a_mile() -> FlowDefinition {
    let stages = CASE_STUDIES
        .iter()
        .enumerate()
        .map(|(i, case)| StageSpec {
            id: format!("scenario_{}", i + 1),
            category: "case_study".to_string(),
            content: json!({
                "id": i + 1,
                "title": case.title,
                "context": case.context,
                "situation": case.situation,
                "approach_a": {"text": case.approach_a.0, "outcome": case.approach_a.1},
                "approach_b": {"text": case.approach_b.0, "outcome": case.approach_b.1},
            }),
            input: InputRule::Choice {
                options: vec![
                    ChoiceOption::new("approach_a", &["directive"]),
                    ChoiceOption::new("approach_b", &["curious"]),
                ],
            },
        })
        .collect();

    FlowDefinition {
        id: WALK_A_MILE.to_string(),
        title: "Walk a Mile".to_string(),
        intro: "Walk in your teenager's shoes through real parenting challenges. Practice empathy and explore different approaches.".to_string(),
        completion_message: "Walk a Mile journey complete! You've practiced empathy through challenging scenarios. Remember: every challenging moment is an opportunity to deepen your connection with your teenager.".to_string(),
        stages,
        transition: TransitionRule::Linear,
        synthesis: None,
    }
}

const REFLECTION_AREAS: &[(&str, [&str; 4])] = &[
    (
        "discipline",
        [
            "How were you disciplined as a child? What methods did your parents use?",
            "When disciplined, how did it make you feel? What did you learn?",
            "What discipline approaches do you automatically use with your teen?",
            "Are there patterns you want to change or continue?",
        ],
    ),
    (
        "communication",
        [
            "How did your parents talk to you about difficult topics as a teenager?",
            "What did you wish they had said differently during conflicts?",
            "When you felt unheard as a teen, what was that like?",
            "How does your communication style change when stressed with your child?",
        ],
    ),
    (
        "expectations",
        [
            "What expectations did your parents have for your future? How did that feel?",
            "Were your parents' dreams aligned with your own interests?",
            "How did their expectations shape your self-worth?",
            "What expectations do you place on your teenager?",
        ],
    ),
    (
        "emotions",
        [
            "How were emotions handled in your childhood home? Which were acceptable?",
            "When upset as a teenager, how did your parents respond?",
            "What emotional needs weren't fully met during your teen years?",
            "How comfortable are you with your teenager's intense emotions?",
        ],
    ),
];

/// Private reflection keyed by area: discipline, communication,
/// expectations, emotions.
pub fn generational_echo() -> FlowDefinition {
    let stages = REFLECTION_AREAS
        .iter()
        .map(|(area, prompts)| StageSpec {
            id: area.to_string(),
            category: area.to_string(),
            content: json!({
                "reflection_area": area,
                "prompts": prompts,
                "privacy_note": "These reflections are completely private and help develop self-awareness.",
            }),
            input: InputRule::FreeText { required: true },
        })
        .collect();

    FlowDefinition {
        id: GENERATIONAL_ECHO.to_string(),
        title: "Generational Echo".to_string(),
        intro: "Private reflection on how your upbringing influences your parenting. Take your time and be honest.".to_string(),
        completion_message: "Reflection complete. Your awareness of these patterns is the first step toward more conscious parenting.".to_string(),
        stages,
        transition: TransitionRule::Keyed(
            REFLECTION_AREAS.iter().map(|(a, _)| a.to_string()).collect(),
        ),
        synthesis: Some(ArtifactKind::GenerationalPattern),
    }
}

struct DiscoveryScenario {
    domain: &'static str,
    scenario: &'static str,
    path_a: (&'static str, [&'static str; 3]),
    path_b: (&'static str, [&'static str; 3]),
}

const DISCOVERY_SCENARIOS: &[DiscoveryScenario] = &[
    DiscoveryScenario {
        domain: "career",
        scenario: "You're offered two job opportunities:",
        path_a: (
            "A secure, well-paying job with a defined career ladder that your family would be proud of",
            ["security", "family_approval", "structure"],
        ),
        path_b: (
            "A lower-paying role at a startup with high risk, but complete creative freedom to build something from scratch",
            ["creativity", "autonomy", "innovation"],
        ),
    },
    DiscoveryScenario {
        domain: "social",
        scenario: "Your friend group is planning something you don't agree with:",
        path_a: (
            "Go along to maintain harmony and avoid conflict",
            ["harmony", "belonging", "peace"],
        ),
        path_b: (
            "Speak your truth, risking conflict but staying authentic to yourself",
            ["authenticity", "integrity", "courage"],
        ),
    },
    DiscoveryScenario {
        domain: "lifestyle",
        scenario: "You have savings and two life paths to choose:",
        path_a: (
            "Buy a home in your familiar hometown, surrounded by support system",
            ["security", "community", "stability"],
        ),
        path_b: (
            "Use savings to travel the world for a year, embracing uncertainty and new experiences",
            ["adventure", "growth", "freedom"],
        ),
    },
    DiscoveryScenario {
        domain: "impact",
        scenario: "You want to make a difference in the world:",
        path_a: (
            "Volunteer for local charity, making direct impact on a few individuals",
            ["compassion", "direct_impact", "community"],
        ),
        path_b: (
            "Work on large-scale policy, indirect impact that might affect thousands in years",
            ["justice", "systemic_change", "patience"],
        ),
    },
    DiscoveryScenario {
        domain: "relationships",
        scenario: "In romantic relationships, you value:",
        path_a: (
            "Deep emotional intimacy and vulnerability, even if it's intense",
            ["intimacy", "authenticity", "depth"],
        ),
        path_b: (
            "Healthy independence and personal space within the relationship",
            ["autonomy", "balance", "respect"],
        ),
    },
    DiscoveryScenario {
        domain: "learning",
        scenario: "When learning something new, you prefer:",
        path_a: (
            "Mastering one subject deeply, becoming an expert in that field",
            ["mastery", "depth", "expertise"],
        ),
        path_b: (
            "Learning broadly across many subjects, staying curious about everything",
            ["curiosity", "breadth", "exploration"],
        ),
    },
    DiscoveryScenario {
        domain: "success",
        scenario: "Your definition of success is:",
        path_a: (
            "Being recognized and respected by others for your achievements",
            ["recognition", "achievement", "status"],
        ),
        path_b: (
            "Feeling fulfilled and proud of your personal growth, regardless of outside recognition",
            ["fulfillment", "growth", "self_worth"],
        ),
    },
];

/// Seven either/or scenarios; each path tags three values.
pub fn values_discovery_expedition() -> FlowDefinition {
    let stages = DISCOVERY_SCENARIOS
        .iter()
        .enumerate()
        .map(|(i, s)| StageSpec {
            id: format!("scenario_{}", i + 1),
            category: s.domain.to_string(),
            content: json!({
                "id": i + 1,
                "domain": s.domain,
                "scenario": s.scenario,
                "path_a": {"text": s.path_a.0, "values": s.path_a.1},
                "path_b": {"text": s.path_b.0, "values": s.path_b.1},
            }),
            input: InputRule::Choice {
                options: vec![
                    ChoiceOption::new("path_a", &s.path_a.1),
                    ChoiceOption::new("path_b", &s.path_b.1),
                ],
            },
        })
        .collect();

    FlowDefinition {
        id: VALUES_DISCOVERY.to_string(),
        title: "Values Discovery Expedition".to_string(),
        intro: "Let's explore what truly drives you. There are no right or wrong answers, only what feels most authentic to you.".to_string(),
        completion_message: "Expedition complete! Do these resonate? Select the 3-5 values that feel like your 'True North'.".to_string(),
        stages,
        transition: TransitionRule::Linear,
        synthesis: Some(ArtifactKind::PatternInsight),
    }
}

const EMPATHY_QUESTIONS: &[(&str, &str, &[&str])] = &[
    (
        "hopes",
        "HOPES & VALUES (What they want for you)",
        &[
            "What is their biggest dream for your future?",
            "What does a 'successful life' look like from their point of view?",
            "What words do they often use when talking about the future?",
        ],
    ),
    (
        "fears",
        "FEARS & ANXIETIES (What they are afraid of)",
        &[
            "What is their absolute worst-case scenario regarding your situation?",
            "What past struggles or regrets in their own life might be influencing their perspective?",
            "What would they feel they have to sacrifice or lose if you follow your path?",
        ],
    ),
    (
        "influences",
        "EXTERNAL INFLUENCES (What shapes their thinking)",
        &[
            "Whose opinions matter most to them? What would those people say?",
            "What cultural messages or media shape their worldview on this topic?",
        ],
    ),
];

/// Eight perspective-taking questions: hopes x3, fears x3, influences x2.
pub fn empathy_map_inquiry() -> FlowDefinition {
    let stages = EMPATHY_QUESTIONS
        .iter()
        .flat_map(|(category, title, questions)| {
            questions.iter().enumerate().map(move |(i, q)| StageSpec {
                id: format!("{}_{}", category, i + 1),
                category: category.to_string(),
                content: json!({
                    "category": category,
                    "category_title": title,
                    "question_number": i + 1,
                    "question": q,
                }),
                input: InputRule::FreeText { required: true },
            })
        })
        .collect();

    FlowDefinition {
        id: EMPATHY_MAP_INQUIRY.to_string(),
        title: "Empathy Map Inquiry".to_string(),
        intro: "Take your time to really think about their perspective. There are no wrong answers.".to_string(),
        completion_message: "Excellent work! You've completed the inquiry phase and your empathy map is ready.".to_string(),
        stages,
        transition: TransitionRule::Linear,
        synthesis: Some(ArtifactKind::EmpathyMap),
    }
}

const FUTURE_SELF_QUESTIONS: &[(&str, &str, &str)] = &[
    (
        "identity",
        "Let's start with the big picture. In one sentence, describe the future self you're working towards.",
        "e.g., A successful freelance photographer living in Tokyo, specializing in street fashion",
    ),
    (
        "environment",
        "Where is this future you? Describe the vibe of your home or workspace.",
        "e.g., A small, minimalist apartment with large windows and organized equipment",
    ),
    (
        "feeling",
        "What three words best describe the feeling of your ideal day?",
        "e.g., Creative, Independent, Inspired",
    ),
    (
        "rituals",
        "Beyond work, what's a small, meaningful activity that's part of your daily routine?",
        "e.g., Starting my day with a quiet hour at a local coffee shop",
    ),
    (
        "accomplishment",
        "What is one skill you've mastered in this future that you're proud of?",
        "e.g., I've become fluent in conversational Japanese",
    ),
];

/// Five free-text prompts feeding the day-in-the-life narrative.
pub fn future_self_input() -> FlowDefinition {
    let stages = FUTURE_SELF_QUESTIONS
        .iter()
        .enumerate()
        .map(|(i, (category, question, placeholder))| StageSpec {
            id: category.to_string(),
            category: category.to_string(),
            content: json!({
                "id": i + 1,
                "question": question,
                "placeholder": placeholder,
                "category": category,
            }),
            input: InputRule::FreeText { required: true },
        })
        .collect();

    FlowDefinition {
        id: FUTURE_SELF_INPUT.to_string(),
        title: "Future Self Simulation".to_string(),
        intro: "Let's build a vivid simulation of your future self. The more detailed you are, the more powerful the experience will be.".to_string(),
        completion_message: "Perfect! Your future self simulation is ready.".to_string(),
        stages,
        transition: TransitionRule::Linear,
        synthesis: Some(ArtifactKind::FutureNarrative),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_flow_validates() {
        for flow in all_flows() {
            flow.validate().unwrap_or_else(|e| panic!("{e}"));
        }
    }

    #[test]
    fn stage_counts() {
        assert_eq!(walk_a_mile().stages.len(), 3);
        assert_eq!(generational_echo().stages.len(), 4);
        assert_eq!(values_discovery_expedition().stages.len(), 7);
        assert_eq!(empathy_map_inquiry().stages.len(), 8);
        assert_eq!(future_self_input().stages.len(), 5);
    }

    #[test]
    fn generational_echo_is_keyed() {
        let flow = generational_echo();
        assert_eq!(
            flow.transition,
            TransitionRule::Keyed(vec![
                "discipline".into(),
                "communication".into(),
                "expectations".into(),
                "emotions".into()
            ])
        );
    }

    #[test]
    fn empathy_categories_in_order() {
        let categories: Vec<String> = empathy_map_inquiry()
            .stages
            .into_iter()
            .map(|s| s.category)
            .collect();
        assert_eq!(
            categories,
            vec!["hopes", "hopes", "hopes", "fears", "fears", "fears", "influences", "influences"]
        );
    }
}
