//! Ordered tool registry and call dispatch.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolContext};
use super::validation;
use crate::error::{ColloquyError, Result};
use crate::transcript::TranscriptEntry;
use crate::wire::WireToolCall;

/// The declared tools of a session, in registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Re-registering a name replaces the earlier entry in
    /// place, keeping its position in the advertised list.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Wire definitions for every registered tool.
    pub fn definitions(&self) -> Vec<Value> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Wire definitions for the named subset, in registration order.
    ///
    /// Fails with [`UndeclaredTool`](ColloquyError::UndeclaredTool) when a
    /// name has no registered tool, so bad filters surface before any
    /// request is sent.
    pub fn definitions_for(&self, names: &[String]) -> Result<Vec<Value>> {
        for name in names {
            if self.get(name).is_none() {
                return Err(ColloquyError::UndeclaredTool(name.clone()));
            }
        }
        Ok(self
            .tools
            .iter()
            .filter(|t| names.iter().any(|n| n == t.name()))
            .map(|t| t.definition())
            .collect())
    }

    /// Run one model-requested call and return its transcript entry.
    ///
    /// The tool's result lands in the transcript unchanged: strings as-is,
    /// everything else serialized to JSON. Execution errors propagate.
    pub(crate) async fn dispatch(
        &self,
        call: &WireToolCall,
        context: &ToolContext,
    ) -> Result<TranscriptEntry> {
        let name = call.function.name.as_str();
        let tool = self
            .get(name)
            .ok_or_else(|| ColloquyError::UndeclaredTool(name.to_string()))?;

        let arguments = ToolArguments::parse(name, &call.function.arguments)?;
        for note in validation::schema_notes(&arguments.as_value(), &tool.parameters().schema) {
            warn!(tool = name, %note, "tool arguments diverge from declared schema");
        }

        debug!(tool = name, call_id = %call.id, "dispatching tool call");
        let result = tool.execute(&arguments, context).await?;
        let content = match result {
            Value::String(text) => text,
            other => serde_json::to_string(&other)?,
        };
        Ok(TranscriptEntry::tool_result(call.id.clone(), name, content))
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
