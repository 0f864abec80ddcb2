//! Prompt construction for synthesis artifacts.

use crate::flows::ResponseRecord;
use crate::synthesis::{ArtifactKind, RankedTag, SynthesisContext, values};

/// Render the history as one line per response.
pub fn render_history(history: &[ResponseRecord]) -> String {
    let mut out = String::with_capacity(history.len() * 64);
    for record in history {
        out.push_str(&format!("- {}", record.stage));
        if let Some(ref choice) = record.choice {
            out.push_str(&format!(": chose {choice}"));
        }
        if let Some(ref text) = record.text {
            let preview: String = text.chars().take(600).collect();
            out.push_str(&format!(": \"{preview}\""));
        }
        if !record.tags.is_empty() {
            out.push_str(&format!(" [{}]", record.tags.join(", ")));
        }
        out.push('\n');
    }
    out
}

fn render_ranking(ranking: &[RankedTag]) -> String {
    ranking
        .iter()
        .map(|r| format!("{}: {}", r.tag, r.count))
        .collect::<Vec<_>>()
        .join(", ")
}

fn answer_for<'a>(history: &'a [ResponseRecord], stage: &str) -> &'a str {
    history
        .iter()
        .find(|r| r.stage == stage)
        .and_then(|r| r.text.as_deref())
        .unwrap_or("")
}

/// System prompt for `kind`.
pub fn system_prompt(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::PatternInsight | ArtifactKind::ValueDefinitions => {
            "You are a warm, perceptive guide helping a young person understand their values. \
             Be validating and specific. Never diagnose."
        }
        ArtifactKind::GenerationalPattern => {
            "You are a gentle reflective coach for parents. You notice patterns carried \
             from one generation to the next without judgment."
        }
        ArtifactKind::EmpathyMap | ArtifactKind::StrategicBrief => {
            "You are a communication coach helping someone understand another person's \
             perspective. Focus on building understanding, not winning arguments."
        }
        ArtifactKind::FutureNarrative => "You are an inspiring storyteller.",
    }
}

/// User prompt for a narrative artifact.
pub fn artifact_prompt(
    kind: ArtifactKind,
    history: &[ResponseRecord],
    ranking: &[RankedTag],
    ctx: &SynthesisContext,
) -> String {
    match kind {
        ArtifactKind::PatternInsight => format!(
            "Analyze this user's values expedition results:\n{}\n\
             The user's choices show these value patterns: {}\n\n\
             Write a warm, insightful 2-3 sentence analysis that:\n\
             1. Highlights the strongest pattern you notice\n\
             2. Connects it to their authentic self\n\
             3. Feels personal and validating\n\n\
             Start with: \"I've noticed a pattern in your expedition...\"",
            render_history(history),
            render_ranking(ranking),
        ),
        ArtifactKind::ValueDefinitions => value_definitions_prompt(history, &ctx.selected),
        ArtifactKind::GenerationalPattern => format!(
            "A parent reflected privately on how they were raised:\n{}\n\
             In 3-4 sentences, name the strongest pattern that echoes from their upbringing \
             into their own parenting, acknowledge what they already see clearly, and offer \
             one small, concrete way to carry forward what serves them.",
            render_history(history),
        ),
        ArtifactKind::EmpathyMap => format!(
            "Analyze these empathy mapping responses about {}{}:\n{}\n\
             Create an empathy map with these 4 quadrants:\n\
             1. HOPES & VALUES: What they want/value most\n\
             2. FEARS & ANXIETIES: What they're afraid of\n\
             3. EXTERNAL INFLUENCES: What shapes their thinking\n\
             4. THE UNSPOKEN CORE: The central driving emotion behind everything\n\n\
             Use bullet points for each quadrant and finish with a one-sentence insight \
             about their primary motivation.",
            ctx.person.as_deref().unwrap_or("this person"),
            ctx.goal
                .as_deref()
                .map(|g| format!(" (conversation goal: \"{g}\")"))
                .unwrap_or_default(),
            render_history(history),
        ),
        ArtifactKind::StrategicBrief => format!(
            "Based on this empathy map for {} and the goal: \"{}\"\n\n{}\n\
             Provide strategic conversation guidance:\n\
             1. BRIDGE: What common ground do you share?\n\
             2. EMPATHY-FIRST OPENING: A suggested conversation starter that acknowledges their core fears\n\
             3. OBJECTION PREPARATION: Likely counter-arguments and thoughtful responses\n\
             4. KEY TALKING POINTS: 3-4 main points that align with their values\n\n\
             Be specific and actionable.",
            ctx.person.as_deref().unwrap_or("them"),
            ctx.goal.as_deref().unwrap_or("be understood"),
            ctx.notes
                .as_deref()
                .map(str::to_string)
                .unwrap_or_else(|| render_history(history)),
        ),
        ArtifactKind::FutureNarrative => format!(
            "Write a vivid, first-person \"Day in the Life\" story (250-300 words) for someone who is: {}\n\n\
             Environment: {}\n\
             Daily ritual: {}\n\
             Key skill: {}\n\
             Mood/feeling: {}\n\n\
             Requirements:\n\
             - Use rich, sensory details\n\
             - Write in first person present tense\n\
             - Include the daily ritual and mention the skill naturally\n\
             - Capture the feeling words throughout\n\
             - End with a sense of fulfillment and purpose\n\
             - Make it feel achievable yet inspiring",
            answer_for(history, "identity"),
            answer_for(history, "environment"),
            answer_for(history, "rituals"),
            answer_for(history, "accomplishment"),
            answer_for(history, "feeling"),
        ),
    }
}

fn value_definitions_prompt(history: &[ResponseRecord], selected: &[String]) -> String {
    let mut prompt = format!(
        "Based on this user's expedition choices:\n{}\n\
         They selected these core values. For each, write a personalized definition that \
         reflects how THEY specifically live this value based on their choices, is warm and \
         affirming, and is 1-2 sentences.\n\n",
        render_history(history),
    );
    for value in selected {
        prompt.push_str(&format!(
            "- {value}: generic definition \"{}\". Start with \"For you, {} means...\"\n",
            values::definition_or_generic(value),
            values::display_name(value),
        ));
    }
    prompt.push_str(
        "\nRespond with ONLY a JSON object mapping each value name exactly as given to its definition.",
    );
    prompt
}

/// Prompt for a compass check against a dilemma.
pub fn compass_check_prompt(values: &[String], dilemma: &str, options: &[String]) -> String {
    format!(
        "A user with these core values: {}\n\n\
         Is facing this dilemma: \"{}\"\n\n\
         Decision options: {}\n\n\
         Provide guidance using the Compass Check Framework:\n\
         1. ALIGNMENT: Which option aligns most with their core values?\n\
         2. TENSION: Does any choice create tension with their values?\n\
         3. INTEGRATION: Is there a creative third path honoring multiple values?\n\n\
         Be supportive, specific, and actionable. Reference their specific values.",
        values.join(", "),
        dilemma,
        if options.is_empty() {
            "Not specified".to_string()
        } else {
            options.join("; ")
        },
    )
}

/// Prompt connecting a future vision to a present-day commitment.
pub fn integration_prompt(identity: &str, commitment: &str) -> String {
    format!(
        "Based on this future vision: {identity}\n\n\
         The user committed to: \"{commitment}\"\n\n\
         Provide encouraging, specific guidance for their first step. Include:\n\
         1. Why this commitment is perfect for moving toward their future\n\
         2. How to make it a sustainable habit\n\
         3. What to focus on this week\n\n\
         Keep it motivating and actionable (2-3 sentences)."
    )
}
