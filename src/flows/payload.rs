//! JSON payloads returned by the guided flow tools.

use serde_json::{Value, json};

use crate::flows::definition::FlowDefinition;
use crate::flows::machine::{COMPLETE, ResponseRecord};
use crate::synthesis::SynthesisArtifact;

/// Payload for an open stage. `stage_id` must belong to `flow`.
pub fn stage_payload(flow: &FlowDefinition, stage_id: &str, history: &[ResponseRecord]) -> Value {
    let index = flow.stage_index(stage_id).unwrap_or(history.len());
    let stage = flow.stages.get(index);

    let mut payload = json!({
        "flow": flow.id,
        "stage": stage_id,
        "current_scenario_or_question": stage.map(|s| s.content.clone()),
        "progress": {
            "current": index + 1,
            "total": flow.stages.len(),
        },
        "responses_so_far": history,
    });

    if let Some(stage) = stage
        && let Some(map) = payload.as_object_mut()
    {
        map.insert("input".to_string(), json!(stage.input));
        if history.is_empty() {
            map.insert("intro_message".to_string(), json!(flow.intro));
        }
    }
    payload
}

/// Payload for a finished session.
pub fn complete_payload(
    flow: &FlowDefinition,
    history: &[ResponseRecord],
    artifact: Option<&SynthesisArtifact>,
) -> Value {
    json!({
        "flow": flow.id,
        "stage": COMPLETE,
        "message": flow.completion_message,
        "artifact": artifact,
        "responses_so_far": history,
    })
}
