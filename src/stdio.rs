//! Line-delimited JSON transport: one request per input line, one envelope
//! per output line, in request order.

use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ToolError;
use crate::tools::{Dispatcher, ToolRequest, failure_envelope};

/// Reported as the tool name when a line cannot be parsed as a request.
const MALFORMED: &str = "unknown";

/// Serve requests from `reader` until EOF.
pub async fn serve<R, W>(dispatcher: &Dispatcher, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = respond(dispatcher, line).await;
        let mut out = response.to_string();
        out.push('\n');
        writer.write_all(out.as_bytes()).await?;
        writer.flush().await?;
    }
    tracing::info!("Input closed, stopping stdio server");
    Ok(())
}

async fn respond(dispatcher: &Dispatcher, line: &str) -> Value {
    let raw: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return malformed(format!("request is not valid JSON: {e}")),
    };

    if raw.get("list_tools").and_then(Value::as_bool) == Some(true) {
        return json!({ "tools": dispatcher.registry().tool_definitions().await });
    }

    match serde_json::from_value::<ToolRequest>(raw) {
        Ok(request) => dispatcher.handle(request).await,
        Err(e) => malformed(format!("request must be {{\"tool\", \"arguments\"}}: {e}")),
    }
}

fn malformed(reason: String) -> Value {
    tracing::warn!(%reason, "Malformed request line");
    failure_envelope(MALFORMED, &ToolError::invalid(MALFORMED, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::io::BufReader;

    use crate::tools::ToolRegistry;
    use crate::tools::builtin::crisis::{InterventionTool, SosTriageTool};
    use crate::triage::Intervention;

    fn dispatcher() -> Dispatcher {
        let registry = ToolRegistry::new();
        registry.register_sync(Arc::new(SosTriageTool));
        registry.register_sync(Arc::new(InterventionTool::new(Intervention::BoxBreathing)));
        Dispatcher::new(Arc::new(registry), Duration::from_secs(5))
    }

    async fn run(input: &str) -> Vec<Value> {
        let mut out = Vec::new();
        serve(&dispatcher(), BufReader::new(input.as_bytes()), &mut out)
            .await
            .unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn one_response_per_line_in_order() {
        let responses = run(concat!(
            r#"{"tool": "box_breathing", "arguments": {"duration_seconds": 32}}"#,
            "\n\n",
            r#"{"tool": "sos_triage"}"#,
            "\n",
        ))
        .await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["tool"], "box_breathing");
        assert_eq!(responses[1]["tool"], "sos_triage");
    }

    #[tokio::test]
    async fn lists_tools() {
        let responses = run("{\"list_tools\": true}\n").await;
        let tools = responses[0]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "box_breathing");
    }

    #[tokio::test]
    async fn malformed_lines_get_failure_envelopes() {
        let responses = run("not json\n{\"arguments\": {}}\n").await;
        assert_eq!(responses.len(), 2);
        for r in &responses {
            assert_eq!(r["status"], "failed");
            assert_eq!(r["kind"], "invalid_argument");
        }
    }
}
