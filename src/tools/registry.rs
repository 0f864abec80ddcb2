//! Tool registry, built once at startup and read-only afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::tools::tool::{Tool, ToolDefinition};
use crate::tools::validation::ArgumentValidator;

/// A registered tool and its compiled parameter schema.
#[derive(Clone)]
pub struct Registered {
    pub tool: Arc<dyn Tool>,
    pub validator: Arc<ArgumentValidator>,
}

/// Registry of available tools. Lookups are case-sensitive.
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Registered>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tool. A later registration under the same name wins.
    /// A tool whose schema does not compile is skipped.
    pub async fn register(&self, tool: Arc<dyn Tool>) {
        let Some(entry) = compile(tool) else { return };
        let name = entry.tool.name().to_string();
        if self.tools.write().await.insert(name.clone(), entry).is_some() {
            tracing::warn!(tool = %name, "Replaced existing tool registration");
        }
        tracing::debug!("Registered tool: {}", name);
    }

    /// Register a tool (sync version for startup).
    pub fn register_sync(&self, tool: Arc<dyn Tool>) {
        let Some(entry) = compile(tool) else { return };
        let name = entry.tool.name().to_string();
        if let Ok(mut tools) = self.tools.try_write() {
            tools.insert(name.clone(), entry);
            tracing::debug!("Registered tool: {}", name);
        } else {
            tracing::warn!(tool = %name, "Registry busy, tool not registered");
        }
    }

    /// Get a tool by name.
    pub async fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().await.get(name).map(|e| e.tool.clone())
    }

    /// Get a tool together with its compiled schema.
    pub async fn lookup(&self, name: &str) -> Option<Registered> {
        self.tools.read().await.get(name).cloned()
    }

    /// Check if a tool exists.
    pub async fn has(&self, name: &str) -> bool {
        self.tools.read().await.contains_key(name)
    }

    /// All tool names, sorted.
    pub async fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get the number of registered tools.
    pub fn count(&self) -> usize {
        self.tools.try_read().map(|t| t.len()).unwrap_or(0)
    }

    /// Definitions for every tool, sorted by name.
    pub async fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .read()
            .await
            .values()
            .map(|e| e.tool.definition())
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }
}

fn compile(tool: Arc<dyn Tool>) -> Option<Registered> {
    match ArgumentValidator::compile(&tool.parameters_schema()) {
        Ok(validator) => Some(Registered {
            tool,
            validator: Arc::new(validator),
        }),
        Err(reason) => {
            tracing::error!(tool = %tool.name(), %reason, "Tool schema rejected, tool not registered");
            None
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
