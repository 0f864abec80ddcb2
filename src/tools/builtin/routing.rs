//! Suggest which tool should handle a piece of free text.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::context::InvocationContext;
use crate::error::ToolError;
use crate::routing::TriggerRouter;
use crate::tools::tool::{Tool, ToolOutput, parse_args};

#[derive(Debug, Deserialize)]
struct RouteArgs {
    user_text: String,
}

pub struct SuggestToolTool {
    router: Arc<TriggerRouter>,
}

impl SuggestToolTool {
    pub fn new(router: Arc<TriggerRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl Tool for SuggestToolTool {
    fn name(&self) -> &str {
        "suggest_tool"
    }

    fn description(&self) -> &str {
        "Suggest the tool best suited to a user's message using the trigger rule table"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_text": {"type": "string", "description": "The user's message"}
            },
            "required": ["user_text"]
        })
    }

    async fn execute(&self, params: Value, _ctx: &InvocationContext) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();
        let args: RouteArgs = parse_args(self.name(), params)?;
        let hit = self.router.route(&args.user_text);

        Ok(ToolOutput::success(
            json!({
                "tool": self.name(),
                "matched": hit.is_some(),
                "rule": hit.as_ref().map(|m| m.rule.as_str()),
                "suggested_tool": hit.as_ref().map(|m| m.target.as_str()),
            }),
            start.elapsed(),
        ))
    }
}
