//! Wellness tools: guided wellness tool orchestration core.

pub mod app;
pub mod config;
pub mod context;
pub mod dialogue;
pub mod error;
pub mod events;
pub mod flows;
pub mod llm;
pub mod routing;
pub mod server;
pub mod stdio;
pub mod store;
pub mod synthesis;
pub mod tools;
pub mod triage;
