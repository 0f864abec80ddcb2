//! Startup wiring: collaborators, the built-in catalog, and the dispatcher.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::events::EventLog;
use crate::flows::FlowDefinition;
use crate::flows::catalog::all_flows;
use crate::llm::{LlmProvider, UnavailableLlm, create_provider};
use crate::routing::TriggerRouter;
use crate::store::LibSqlObjectStore;
use crate::tools::{Dispatcher, ToolDeps, ToolRegistry, register_builtin_tools};

/// Build a dispatcher with every built-in tool registered.
///
/// Without LLM credentials the generative tools still work; they return
/// their static fallbacks.
pub async fn build_dispatcher(config: &AppConfig) -> Result<Dispatcher> {
    check_flows(&all_flows())?;

    let llm: Arc<dyn LlmProvider> = match &config.llm {
        Some(llm_config) => create_provider(llm_config)?,
        None => {
            tracing::warn!("No API key set, generative tools will use static fallbacks");
            Arc::new(UnavailableLlm)
        }
    };

    let store = LibSqlObjectStore::open(&config.db_path).await?;

    let deps = ToolDeps {
        llm,
        events: EventLog::new(Arc::new(store)),
        router: Arc::new(TriggerRouter::default_rules()?),
        llm_timeout: config.llm_timeout,
    };
    let registry = ToolRegistry::new();
    register_builtin_tools(&registry, &deps);
    Ok(Dispatcher::new(Arc::new(registry), config.tool_timeout))
}

/// Refuse to start on an inconsistent flow definition.
fn check_flows(flows: &[FlowDefinition]) -> Result<()> {
    for flow in flows {
        flow.validate().map_err(Error::InvalidFlow)?;
    }
    tracing::debug!(count = flows.len(), "Flow definitions checked");
    Ok(())
}
