//! Synthesis stage: turns a finished session's history into an artifact.
//!
//! Two parts:
//! 1. A deterministic tag tally, ranked by count (ties by first occurrence)
//! 2. Exactly one generative call per artifact for the narrative part
//!
//! The generative call is bounded by a timeout. When it fails the artifact
//! still carries its ranking; only the narrative fields are left empty.

pub mod prompts;
pub mod values;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ErrorKind;
use crate::flows::ResponseRecord;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, complete_within, extract_json_object};

const SYNTHESIS_TEMPERATURE: f32 = 0.7;
const SYNTHESIS_MAX_TOKENS: u32 = 900;

/// Tags counted at least this often are highlighted.
const HIGHLIGHT_THRESHOLD: u32 = 3;

/// Value definitions are written for at most this many values.
const TRUE_NORTH_COUNT: usize = 3;

/// What a synthesis call produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Values expedition: insight over the value tally.
    PatternInsight,
    /// Personalized definition per selected value.
    ValueDefinitions,
    /// Generational echo reflections.
    GenerationalPattern,
    /// Four-quadrant empathy map.
    EmpathyMap,
    /// Conversation strategy built from an empathy map.
    StrategicBrief,
    /// Future self day-in-the-life story.
    FutureNarrative,
}

impl ArtifactKind {
    /// Maximum ranking entries kept for this kind.
    fn ranking_limit(self) -> Option<usize> {
        match self {
            Self::PatternInsight => Some(7),
            _ => None,
        }
    }
}

/// Extra inputs some artifact kinds need beyond the history.
#[derive(Debug, Clone, Default)]
pub struct SynthesisContext {
    pub person: Option<String>,
    pub goal: Option<String>,
    /// Values picked by the user, for `ValueDefinitions`.
    pub selected: Vec<String>,
    /// Pre-rendered material (e.g. an earlier empathy map).
    pub notes: Option<String>,
}

/// One ranking entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedTag {
    pub tag: String,
    pub count: u32,
    pub definition: String,
    pub highlighted: bool,
}

/// A generated narrative for one ranked item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemNarrative {
    pub item: String,
    pub text: String,
}

/// Output of the synthesis stage.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisArtifact {
    pub kind: ArtifactKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight: Option<String>,
    pub ranking: Vec<RankedTag>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub narratives: Vec<ItemNarrative>,
}

/// Tally tags across `history`, most frequent first. Ties keep the order
/// in which tags first appeared.
pub fn rank_tags(history: &[ResponseRecord]) -> Vec<(String, u32)> {
    let mut tally: Vec<(String, u32)> = Vec::new();
    for tag in history.iter().flat_map(|r| r.tags.iter()) {
        match tally.iter_mut().find(|(t, _)| t == tag) {
            Some((_, count)) => *count += 1,
            None => tally.push((tag.clone(), 1)),
        }
    }
    // Stable sort preserves first-occurrence order among equal counts.
    tally.sort_by(|a, b| b.1.cmp(&a.1));
    tally
}

fn ranking_for(history: &[ResponseRecord], kind: ArtifactKind) -> Vec<RankedTag> {
    let mut ranked = rank_tags(history);
    if let Some(limit) = kind.ranking_limit() {
        ranked.truncate(limit);
    }
    ranked
        .into_iter()
        .map(|(tag, count)| RankedTag {
            definition: values::definition_or_generic(&tag).to_string(),
            highlighted: count >= HIGHLIGHT_THRESHOLD,
            tag,
            count,
        })
        .collect()
}

/// Runs synthesis against a generative collaborator.
pub struct Synthesizer {
    llm: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Synthesize an artifact with no extra context.
    pub async fn synthesize(
        &self,
        history: &[ResponseRecord],
        kind: ArtifactKind,
    ) -> SynthesisArtifact {
        self.synthesize_with(history, kind, &SynthesisContext::default())
            .await
    }

    /// Synthesize an artifact. Never fails: a collaborator fault leaves the
    /// narrative fields empty.
    pub async fn synthesize_with(
        &self,
        history: &[ResponseRecord],
        kind: ArtifactKind,
        ctx: &SynthesisContext,
    ) -> SynthesisArtifact {
        let ranking = ranking_for(history, kind);
        let mut artifact = SynthesisArtifact {
            kind,
            insight: None,
            ranking,
            narratives: Vec::new(),
        };

        match kind {
            ArtifactKind::ValueDefinitions => {
                let items: Vec<String> = if ctx.selected.is_empty() {
                    artifact.ranking.iter().map(|r| r.tag.clone()).collect()
                } else {
                    ctx.selected.clone()
                };
                let items: Vec<String> = items.into_iter().take(TRUE_NORTH_COUNT).collect();
                if !items.is_empty() {
                    let scoped = SynthesisContext {
                        selected: items.clone(),
                        ..ctx.clone()
                    };
                    let prompt = prompts::artifact_prompt(kind, history, &artifact.ranking, &scoped);
                    if let Some(raw) = self
                        .narrate(prompts::system_prompt(kind), prompt, SYNTHESIS_MAX_TOKENS)
                        .await
                    {
                        artifact.narratives = parse_item_narratives(&raw, &items);
                    }
                }
            }
            _ => {
                let prompt = prompts::artifact_prompt(kind, history, &artifact.ranking, ctx);
                artifact.insight = self
                    .narrate(prompts::system_prompt(kind), prompt, SYNTHESIS_MAX_TOKENS)
                    .await;
            }
        }

        debug!(
            kind = ?kind,
            ranked = artifact.ranking.len(),
            has_insight = artifact.insight.is_some(),
            narratives = artifact.narratives.len(),
            "Synthesis complete"
        );
        artifact
    }

    /// One bounded generative call. Returns the trimmed text, or `None` when
    /// the collaborator fails, times out, or returns nothing.
    pub async fn narrate(&self, system: &str, prompt: String, max_tokens: u32) -> Option<String> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(system),
            ChatMessage::user(prompt),
        ])
        .with_temperature(SYNTHESIS_TEMPERATURE)
        .with_max_tokens(max_tokens);

        match complete_within(self.llm.as_ref(), request, self.timeout).await {
            Ok(response) => {
                let text = response.content.trim();
                if text.is_empty() {
                    warn!(
                        model = %self.llm.model_name(),
                        kind = %ErrorKind::CollaboratorUnavailable,
                        "Generative call returned blank text"
                    );
                    None
                } else {
                    Some(text.to_string())
                }
            }
            Err(e) => {
                warn!(
                    model = %self.llm.model_name(),
                    kind = %ErrorKind::CollaboratorUnavailable,
                    error = %e,
                    "Generative call failed, degrading"
                );
                None
            }
        }
    }
}

/// Parse `{item: text}` JSON, keeping only requested items in request order.
fn parse_item_narratives(raw: &str, items: &[String]) -> Vec<ItemNarrative> {
    let json = extract_json_object(raw);
    let map: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&json) {
        Ok(map) => map,
        Err(e) => {
            warn!(error = %e, "Value definitions were not a JSON object");
            return Vec::new();
        }
    };

    items
        .iter()
        .filter_map(|item| {
            let text = map.get(item)?.as_str()?.trim();
            (!text.is_empty()).then(|| ItemNarrative {
                item: item.clone(),
                text: text.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::LlmError;
    use crate::llm::{CompletionResponse, FinishReason};

    struct CountingLlm {
        response: Result<String, ()>,
        calls: AtomicUsize,
    }

    impl CountingLlm {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                response: Err(()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for CountingLlm {
        fn model_name(&self) -> &str {
            "counting"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(text) => Ok(CompletionResponse {
                    content: text.clone(),
                    input_tokens: 10,
                    output_tokens: 10,
                    finish_reason: FinishReason::Stop,
                }),
                Err(()) => Err(LlmError::RequestFailed {
                    provider: "counting".into(),
                    reason: "boom".into(),
                }),
            }
        }
    }

    fn tagged(stage: &str, tags: &[&str]) -> ResponseRecord {
        ResponseRecord {
            stage: stage.into(),
            sequence: 1,
            choice: Some("path_a".into()),
            text: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn autonomy_history() -> Vec<ResponseRecord> {
        vec![
            tagged("scenario_1", &["security", "creativity"]),
            tagged("scenario_2", &["autonomy", "creativity"]),
            tagged("scenario_3", &["autonomy"]),
            tagged("scenario_4", &["autonomy"]),
        ]
    }

    #[test]
    fn ranking_by_count_descending() {
        let ranked = rank_tags(&autonomy_history());
        assert_eq!(
            ranked,
            vec![
                ("autonomy".to_string(), 3),
                ("creativity".to_string(), 2),
                ("security".to_string(), 1),
            ]
        );
    }

    #[test]
    fn ties_keep_first_occurrence_order() {
        let history = vec![tagged("a", &["zeal", "balance"]), tagged("b", &["balance", "zeal"])];
        let ranked = rank_tags(&history);
        assert_eq!(ranked[0].0, "zeal");
        assert_eq!(ranked[1].0, "balance");
    }

    #[tokio::test]
    async fn pattern_insight_uses_one_call_and_highlights() {
        let llm = CountingLlm::ok("  I've noticed a pattern in your expedition...  ");
        let synth = Synthesizer::new(llm.clone(), Duration::from_secs(1));

        let artifact = synth
            .synthesize(&autonomy_history(), ArtifactKind::PatternInsight)
            .await;

        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            artifact.insight.as_deref(),
            Some("I've noticed a pattern in your expedition...")
        );
        assert_eq!(artifact.ranking[0].tag, "autonomy");
        assert!(artifact.ranking[0].highlighted);
        assert!(!artifact.ranking[1].highlighted);
        assert!(artifact.ranking[0].definition.starts_with("The freedom"));
    }

    #[tokio::test]
    async fn failure_keeps_ranking_and_drops_insight() {
        let llm = CountingLlm::failing();
        let synth = Synthesizer::new(llm.clone(), Duration::from_secs(1));

        let artifact = synth
            .synthesize(&autonomy_history(), ArtifactKind::PatternInsight)
            .await;

        assert!(artifact.insight.is_none());
        assert_eq!(artifact.ranking.len(), 3);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn blank_output_is_treated_as_failure() {
        let synth = Synthesizer::new(CountingLlm::ok("   "), Duration::from_secs(1));
        let artifact = synth
            .synthesize(&[], ArtifactKind::GenerationalPattern)
            .await;
        assert!(artifact.insight.is_none());
        assert!(artifact.ranking.is_empty());
    }

    #[tokio::test]
    async fn value_definitions_single_call_keyed_by_item() {
        let llm = CountingLlm::ok(
            "```json\n{\"autonomy\": \"For you, Autonomy means choosing your own path.\", \
             \"creativity\": \"For you, Creativity means building from scratch.\", \
             \"extra\": \"ignored\"}\n```",
        );
        let synth = Synthesizer::new(llm.clone(), Duration::from_secs(1));
        let ctx = SynthesisContext {
            selected: vec!["creativity".into(), "autonomy".into()],
            ..Default::default()
        };

        let artifact = synth
            .synthesize_with(&autonomy_history(), ArtifactKind::ValueDefinitions, &ctx)
            .await;

        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        let items: Vec<&str> = artifact.narratives.iter().map(|n| n.item.as_str()).collect();
        assert_eq!(items, vec!["creativity", "autonomy"]);
        assert!(artifact.insight.is_none());
    }

    #[tokio::test]
    async fn empty_definitions_object_yields_no_narratives() {
        let llm = CountingLlm::ok("{}");
        let synth = Synthesizer::new(llm.clone(), Duration::from_secs(1));
        let ctx = SynthesisContext {
            selected: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            ..Default::default()
        };
        let artifact = synth
            .synthesize_with(&[], ArtifactKind::ValueDefinitions, &ctx)
            .await;
        assert!(artifact.narratives.is_empty());
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unparseable_definitions_yield_nothing() {
        assert!(parse_item_narratives("not json", &["autonomy".into()]).is_empty());
    }

    #[test]
    fn artifact_serializes_without_empty_fields() {
        let artifact = SynthesisArtifact {
            kind: ArtifactKind::PatternInsight,
            insight: None,
            ranking: vec![],
            narratives: vec![],
        };
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "pattern_insight", "ranking": []}));
    }
}
