//! Guided multi-stage flows: definitions, the state machine, and payloads.

pub mod catalog;
pub mod definition;
pub mod machine;
pub mod payload;

pub use definition::{ChoiceOption, FlowDefinition, InputRule, StageSpec, TransitionRule};
pub use machine::{Advance, COMPLETE, ResponseRecord, START, SessionState, StageInput, advance};
