//! Tool abstraction, registry, and dispatch.

pub mod builtin;
pub mod dispatcher;
pub mod registry;
pub mod tool;
pub mod validation;

pub use builtin::{ToolDeps, register_builtin_tools};
pub use dispatcher::{Dispatcher, ToolRequest, failure_envelope};
pub use registry::ToolRegistry;
pub use tool::*;
