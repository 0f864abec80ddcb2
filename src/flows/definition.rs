//! Flow definition table types.
//!
//! A `FlowDefinition` is pure data: an ordered list of stages, the rule for
//! moving between them, and what (if anything) to synthesize at the end.
//! Definitions are built once at startup and shared behind `Arc`.

use serde::Serialize;
use serde_json::Value;

use crate::synthesis::ArtifactKind;

/// One selectable option of a choice stage.
#[derive(Debug, Clone, Serialize)]
pub struct ChoiceOption {
    pub key: String,
    /// Labels recorded on the response when this option is picked.
    pub tags: Vec<String>,
}

impl ChoiceOption {
    pub fn new(key: &str, tags: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// What a stage accepts as input.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputRule {
    /// Exactly one of the declared option keys.
    Choice { options: Vec<ChoiceOption> },
    /// Free text; blank text is rejected when `required`.
    FreeText { required: bool },
}

impl InputRule {
    pub fn option(&self, key: &str) -> Option<&ChoiceOption> {
        match self {
            Self::Choice { options } => options.iter().find(|o| o.key == key),
            Self::FreeText { .. } => None,
        }
    }

    pub fn option_keys(&self) -> Vec<&str> {
        match self {
            Self::Choice { options } => options.iter().map(|o| o.key.as_str()).collect(),
            Self::FreeText { .. } => Vec::new(),
        }
    }
}

/// One step of a flow.
#[derive(Debug, Clone, Serialize)]
pub struct StageSpec {
    pub id: String,
    pub category: String,
    /// Prompt/scenario content shown to the user.
    pub content: Value,
    pub input: InputRule,
}

/// How the next stage is chosen after a stage resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionRule {
    /// Next stage is the following index; terminal past the end.
    Linear,
    /// Stage ids are category keys; next stage is the next key in this
    /// fixed vocabulary, terminal after the last.
    Keyed(Vec<String>),
}

/// Static description of a guided flow.
#[derive(Debug, Clone)]
pub struct FlowDefinition {
    pub id: String,
    pub title: String,
    pub intro: String,
    pub completion_message: String,
    pub stages: Vec<StageSpec>,
    pub transition: TransitionRule,
    pub synthesis: Option<ArtifactKind>,
}

impl FlowDefinition {
    /// Position of `stage_id` in the stage list.
    pub fn stage_index(&self, stage_id: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.id == stage_id)
    }

    pub fn stage(&self, stage_id: &str) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.id == stage_id)
    }

    pub fn first_stage(&self) -> Option<&StageSpec> {
        self.stages.first()
    }

    /// Stage id that follows the stage at `index`, or `None` when terminal.
    pub fn next_stage_id(&self, index: usize) -> Option<String> {
        match &self.transition {
            TransitionRule::Linear => self.stages.get(index + 1).map(|s| s.id.clone()),
            TransitionRule::Keyed(vocabulary) => {
                let current = &self.stages.get(index)?.id;
                let pos = vocabulary.iter().position(|k| k == current)?;
                vocabulary.get(pos + 1).cloned()
            }
        }
    }

    /// Check internal consistency: unique stage ids, and for keyed flows
    /// a vocabulary that names exactly the stages, in order.
    pub fn validate(&self) -> Result<(), String> {
        if self.stages.is_empty() {
            return Err(format!("flow {} has no stages", self.id));
        }
        for (i, stage) in self.stages.iter().enumerate() {
            if matches!(stage.id.as_str(), "start" | "complete") {
                return Err(format!("flow {} uses reserved stage id '{}'", self.id, stage.id));
            }
            if self.stages[..i].iter().any(|s| s.id == stage.id) {
                return Err(format!("flow {} repeats stage id '{}'", self.id, stage.id));
            }
        }
        if let TransitionRule::Keyed(vocabulary) = &self.transition {
            let ids: Vec<&str> = self.stages.iter().map(|s| s.id.as_str()).collect();
            let keys: Vec<&str> = vocabulary.iter().map(|k| k.as_str()).collect();
            if ids != keys {
                return Err(format!(
                    "flow {} keyed vocabulary {:?} does not match stages {:?}",
                    self.id, keys, ids
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stage(id: &str) -> StageSpec {
        StageSpec {
            id: id.to_string(),
            category: id.to_string(),
            content: json!({}),
            input: InputRule::FreeText { required: true },
        }
    }

    fn keyed(ids: &[&str], vocabulary: &[&str]) -> FlowDefinition {
        FlowDefinition {
            id: "keyed".into(),
            title: "Keyed".into(),
            intro: String::new(),
            completion_message: String::new(),
            stages: ids.iter().map(|id| stage(id)).collect(),
            transition: TransitionRule::Keyed(vocabulary.iter().map(|s| s.to_string()).collect()),
            synthesis: None,
        }
    }

    #[test]
    fn keyed_next_follows_vocabulary() {
        let flow = keyed(&["a", "b", "c"], &["a", "b", "c"]);
        assert_eq!(flow.next_stage_id(0).as_deref(), Some("b"));
        assert_eq!(flow.next_stage_id(1).as_deref(), Some("c"));
        assert_eq!(flow.next_stage_id(2), None);
        assert!(flow.validate().is_ok());
    }

    #[test]
    fn mismatched_vocabulary_fails_validation() {
        let flow = keyed(&["a", "b"], &["b", "a"]);
        assert!(flow.validate().is_err());
    }

    #[test]
    fn reserved_and_duplicate_ids_fail_validation() {
        let mut flow = keyed(&["a"], &["a"]);
        flow.transition = TransitionRule::Linear;
        flow.stages.push(stage("a"));
        assert!(flow.validate().unwrap_err().contains("repeats"));

        flow.stages = vec![stage("complete")];
        assert!(flow.validate().unwrap_err().contains("reserved"));
    }

    #[test]
    fn option_lookup() {
        let rule = InputRule::Choice {
            options: vec![
                ChoiceOption::new("path_a", &["security"]),
                ChoiceOption::new("path_b", &["autonomy"]),
            ],
        };
        assert_eq!(rule.option("path_b").unwrap().tags, vec!["autonomy"]);
        assert!(rule.option("path_c").is_none());
        assert_eq!(rule.option_keys(), vec!["path_a", "path_b"]);
    }
}
