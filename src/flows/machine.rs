//! Session state machine.
//!
//! `advance` is a pure function of `(flow, history, current_stage, input)`.
//! Nothing is stored between calls: the caller round-trips the history it
//! got back last time.

use serde::{Deserialize, Serialize};

use crate::error::FlowError;
use crate::flows::definition::{FlowDefinition, InputRule};

/// Stage marker that begins a session.
pub const START: &str = "start";
/// Stage marker of a finished session.
pub const COMPLETE: &str = "complete";

/// One resolved stage. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub stage: String,
    pub sequence: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input submitted for a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageInput {
    None,
    Choice(String),
    Text(String),
}

/// Outcome of a successful `advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    pub next_stage: Option<String>,
    pub history: Vec<ResponseRecord>,
    pub done: bool,
}

/// Resolve `current_stage` with `input` and compute what comes next.
///
/// Failed calls never touch the history.
pub fn advance(
    flow: &FlowDefinition,
    history: &[ResponseRecord],
    current_stage: &str,
    input: &StageInput,
) -> Result<Advance, FlowError> {
    if current_stage == START {
        let first = flow.first_stage().map(|s| s.id.clone());
        return Ok(Advance {
            done: first.is_none(),
            next_stage: first,
            history: history.to_vec(),
        });
    }

    if current_stage == COMPLETE || history.len() >= flow.stages.len() {
        return Err(FlowError::SessionComplete {
            flow: flow.id.clone(),
        });
    }

    let index = flow
        .stage_index(current_stage)
        .ok_or_else(|| FlowError::UnknownStage {
            flow: flow.id.clone(),
            stage: current_stage.to_string(),
        })?;

    check_order(flow, history, current_stage, index)?;

    let stage = &flow.stages[index];
    let (choice, text, tags) = match (&stage.input, input) {
        (InputRule::Choice { .. }, StageInput::Choice(key)) => {
            let option = stage.input.option(key).ok_or_else(|| FlowError::InvalidChoice {
                stage: stage.id.clone(),
                choice: key.clone(),
            })?;
            (Some(key.clone()), None, option.tags.clone())
        }
        (InputRule::Choice { .. }, _) => {
            return Err(FlowError::InvalidInput {
                stage: stage.id.clone(),
                reason: format!("expected one of {:?}", stage.input.option_keys()),
            });
        }
        (InputRule::FreeText { required }, StageInput::Text(t)) => {
            if *required && t.trim().is_empty() {
                return Err(blank(&stage.id));
            }
            (None, Some(t.trim().to_string()), Vec::new())
        }
        (InputRule::FreeText { required: true }, _) => return Err(blank(&stage.id)),
        (InputRule::FreeText { required: false }, _) => (None, None, Vec::new()),
    };

    // check_order pins records to 1..=n, so this is the next position
    let sequence = next_sequence(history.len()).ok_or_else(|| FlowError::InvalidInput {
        stage: stage.id.clone(),
        reason: "history is too long".to_string(),
    })?;
    let mut updated = history.to_vec();
    updated.push(ResponseRecord {
        stage: stage.id.clone(),
        sequence,
        choice,
        text,
        tags,
    });

    let next_stage = flow.next_stage_id(index);
    Ok(Advance {
        done: next_stage.is_none(),
        next_stage,
        history: updated,
    })
}

fn next_sequence(len: usize) -> Option<u32> {
    u32::try_from(len).ok()?.checked_add(1)
}

fn blank(stage: &str) -> FlowError {
    FlowError::InvalidInput {
        stage: stage.to_string(),
        reason: "a non-empty response is required".to_string(),
    }
}

/// The declared stage must be the one the history implies, and the history
/// must be a prefix of the flow's stage order numbered 1, 2, 3, ...
fn check_order(
    flow: &FlowDefinition,
    history: &[ResponseRecord],
    current_stage: &str,
    index: usize,
) -> Result<(), FlowError> {
    let expected = &flow.stages[history.len()].id;
    let out_of_order = || FlowError::OutOfOrder {
        flow: flow.id.clone(),
        stage: current_stage.to_string(),
        expected: expected.clone(),
    };

    if index != history.len() {
        return Err(out_of_order());
    }

    for (position, (record, spec)) in history.iter().zip(&flow.stages).enumerate() {
        if record.stage != spec.id || next_sequence(position) != Some(record.sequence) {
            return Err(FlowError::InvalidInput {
                stage: record.stage.clone(),
                reason: "history does not match the flow's stage order".to_string(),
            });
        }
    }
    Ok(())
}

/// Caller-owned session snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub flow: String,
    /// `start`, a stage id, or `complete`.
    pub stage: String,
    pub responses: Vec<ResponseRecord>,
    pub sequence: u32,
}

impl SessionState {
    pub fn new(flow: &FlowDefinition) -> Self {
        Self {
            flow: flow.id.clone(),
            stage: START.to_string(),
            responses: Vec::new(),
            sequence: 0,
        }
    }

    /// Rebuild a snapshot from what the caller round-tripped.
    pub fn resume(flow: &FlowDefinition, stage: &str, responses: Vec<ResponseRecord>) -> Self {
        Self {
            flow: flow.id.clone(),
            stage: stage.to_string(),
            sequence: responses.last().map(|r| r.sequence).unwrap_or(0),
            responses,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.stage == COMPLETE
    }

    /// Apply one input, producing the next snapshot.
    pub fn apply(&self, flow: &FlowDefinition, input: &StageInput) -> Result<Self, FlowError> {
        let step = advance(flow, &self.responses, &self.stage, input)?;
        let sequence = step.history.last().map(|r| r.sequence).unwrap_or(0);
        Ok(Self {
            flow: self.flow.clone(),
            stage: step.next_stage.unwrap_or_else(|| COMPLETE.to_string()),
            responses: step.history,
            sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::catalog;

    fn choice(key: &str) -> StageInput {
        StageInput::Choice(key.to_string())
    }

    fn text(t: &str) -> StageInput {
        StageInput::Text(t.to_string())
    }

    #[test]
    fn start_is_idempotent() {
        for flow in catalog::all_flows() {
            let a = advance(&flow, &[], START, &StageInput::None).unwrap();
            let b = advance(&flow, &[], START, &StageInput::None).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.next_stage.as_deref(), Some(flow.stages[0].id.as_str()));
            assert!(a.history.is_empty());
            assert!(!a.done);
        }
    }

    #[test]
    fn walk_a_mile_completes_on_third_choice() {
        let flow = catalog::walk_a_mile();
        let s1 = advance(&flow, &[], "scenario_1", &choice("approach_b")).unwrap();
        assert_eq!(s1.next_stage.as_deref(), Some("scenario_2"));
        let s2 = advance(&flow, &s1.history, "scenario_2", &choice("approach_a")).unwrap();
        assert!(!s2.done);
        let s3 = advance(&flow, &s2.history, "scenario_3", &choice("approach_b")).unwrap();
        assert!(s3.done);
        assert_eq!(s3.next_stage, None);
        assert_eq!(s3.history.len(), 3);
        assert_eq!(
            s3.history.iter().map(|r| r.sequence).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn generational_echo_completes_after_emotions() {
        let flow = catalog::generational_echo();
        let mut history = Vec::new();
        let mut stage = advance(&flow, &history, START, &StageInput::None)
            .unwrap()
            .next_stage
            .unwrap();
        let mut visited = vec![stage.clone()];
        loop {
            let step = advance(&flow, &history, &stage, &text("a reflection")).unwrap();
            history = step.history;
            match step.next_stage {
                Some(next) => {
                    visited.push(next.clone());
                    stage = next;
                }
                None => {
                    assert!(step.done);
                    break;
                }
            }
        }
        assert_eq!(
            visited,
            vec!["discipline", "communication", "expectations", "emotions"]
        );
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn terminal_lock_rejects_further_submissions() {
        let flow = catalog::walk_a_mile();
        let mut history = Vec::new();
        for id in ["scenario_1", "scenario_2", "scenario_3"] {
            history = advance(&flow, &history, id, &choice("approach_a"))
                .unwrap()
                .history;
        }

        for stage in [COMPLETE, "scenario_3", "scenario_1"] {
            let err = advance(&flow, &history, stage, &choice("approach_a")).unwrap_err();
            assert!(matches!(err, FlowError::SessionComplete { .. }), "{stage}");
        }
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn invalid_choice_appends_nothing() {
        let flow = catalog::values_discovery_expedition();
        let err = advance(&flow, &[], "scenario_1", &choice("path_c")).unwrap_err();
        assert_eq!(
            err,
            FlowError::InvalidChoice {
                stage: "scenario_1".into(),
                choice: "path_c".into()
            }
        );
    }

    #[test]
    fn choice_records_option_tags() {
        let flow = catalog::values_discovery_expedition();
        let step = advance(&flow, &[], "scenario_1", &choice("path_b")).unwrap();
        assert_eq!(
            step.history[0].tags,
            vec!["creativity", "autonomy", "innovation"]
        );
    }

    #[test]
    fn skipping_ahead_is_out_of_order() {
        let flow = catalog::walk_a_mile();
        let err = advance(&flow, &[], "scenario_2", &choice("approach_a")).unwrap_err();
        assert!(matches!(
            err,
            FlowError::OutOfOrder { ref expected, .. } if expected == "scenario_1"
        ));
    }

    #[test]
    fn tampered_history_is_rejected() {
        let flow = catalog::walk_a_mile();
        let forged = vec![ResponseRecord {
            stage: "scenario_3".into(),
            sequence: 1,
            choice: Some("approach_a".into()),
            text: None,
            tags: vec![],
        }];
        let err = advance(&flow, &forged, "scenario_2", &choice("approach_a")).unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput { .. }));
    }

    #[test]
    fn oversized_sequence_is_rejected_not_overflowed() {
        let flow = catalog::walk_a_mile();
        let forged = vec![ResponseRecord {
            stage: "scenario_1".into(),
            sequence: u32::MAX,
            choice: Some("approach_a".into()),
            text: None,
            tags: vec![],
        }];
        let err = advance(&flow, &forged, "scenario_2", &choice("approach_a")).unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput { ref stage, .. } if stage == "scenario_1"));
    }

    #[test]
    fn sequences_must_count_from_one() {
        let flow = catalog::walk_a_mile();
        let first = advance(&flow, &[], "scenario_1", &choice("approach_a")).unwrap();
        let mut gapped = first.history.clone();
        gapped[0].sequence = 5;
        assert!(advance(&flow, &gapped, "scenario_2", &choice("approach_a")).is_err());
        assert!(advance(&flow, &first.history, "scenario_2", &choice("approach_a")).is_ok());
    }

    #[test]
    fn blank_required_text_is_rejected() {
        let flow = catalog::future_self_input();
        let err = advance(&flow, &[], "identity", &text("   ")).unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput { .. }));
        let err = advance(&flow, &[], "identity", &StageInput::None).unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput { .. }));
    }

    #[test]
    fn choice_stage_rejects_text() {
        let flow = catalog::walk_a_mile();
        let err = advance(&flow, &[], "scenario_1", &text("approach_a")).unwrap_err();
        assert!(matches!(err, FlowError::InvalidInput { .. }));
    }

    #[test]
    fn unknown_stage_is_reported() {
        let flow = catalog::walk_a_mile();
        let err = advance(&flow, &[], "scenario_9", &choice("approach_a")).unwrap_err();
        assert!(matches!(err, FlowError::UnknownStage { .. }));
    }

    #[test]
    fn session_state_walks_to_complete() {
        let flow = catalog::empathy_map_inquiry();
        let mut state = SessionState::new(&flow);
        state = state.apply(&flow, &StageInput::None).unwrap();
        assert_eq!(state.stage, "hopes_1");
        while !state.is_complete() {
            let before = state.sequence;
            state = state.apply(&flow, &text("an answer")).unwrap();
            assert_eq!(state.sequence, before + 1);
        }
        assert_eq!(state.responses.len(), 8);
        assert_eq!(state.sequence, 8);

        let resumed = SessionState::resume(&flow, COMPLETE, state.responses.clone());
        assert_eq!(resumed, state);
        assert!(matches!(
            state.apply(&flow, &text("more")),
            Err(FlowError::SessionComplete { .. })
        ));
    }
}
