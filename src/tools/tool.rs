//! Tool trait, closure-based tool wrapper, and the execution context.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::types::ToolParameters;
use crate::error::Result;
use crate::hooks::ContextMetadata;
use crate::transcript::TranscriptEntry;

/// Cooperative flag a tool raises to end the continuation loop early.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Context available during tool execution.
#[derive(Clone)]
pub struct ToolContext {
    metadata: ContextMetadata,
    stop: StopSignal,
    outbox: Arc<Mutex<Vec<TranscriptEntry>>>,
    cache: Option<Arc<dyn Any + Send + Sync>>,
}

impl ToolContext {
    pub(crate) fn new(metadata: ContextMetadata) -> Self {
        Self {
            metadata,
            stop: StopSignal::default(),
            outbox: Arc::new(Mutex::new(Vec::new())),
            cache: None,
        }
    }

    pub fn metadata(&self) -> &ContextMetadata {
        &self.metadata
    }

    /// Cache handle for tool handlers. Reserved; the loop never populates it.
    pub fn cache(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.cache.as_deref()
    }

    /// Ask the loop to wrap up: after the current batch of results, the
    /// model is asked for a closing reply instead of further tool calls.
    pub fn stop_looping(&self) {
        self.stop.trigger();
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop.is_triggered()
    }

    /// Queue a transcript entry to append once this batch of tools is done.
    pub fn append_transcript(&self, entry: TranscriptEntry) {
        self.outbox.lock().expect("tool outbox poisoned").push(entry);
    }

    pub(crate) fn drain_transcript(&self) -> Vec<TranscriptEntry> {
        std::mem::take(&mut *self.outbox.lock().expect("tool outbox poisoned"))
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("metadata", &self.metadata)
            .field("stop", &self.stop)
            .field("cache", &self.cache.is_some())
            .finish()
    }
}

/// Core tool trait. Implement to declare a callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema parameters.
    fn parameters(&self) -> &ToolParameters;

    /// Execute the tool with parsed arguments.
    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> Result<serde_json::Value>;

    /// Wire definition advertised to the model.
    fn definition(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters().schema.clone(),
            }
        })
    }
}

/// Type alias for the tool handler function.
type ToolHandler = dyn Fn(
        ToolArguments,
        ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send>>
    + Send
    + Sync;

/// Closure-based tool for quick tool creation.
pub struct FunctionTool {
    name: String,
    description: String,
    parameters: ToolParameters,
    handler: Arc<ToolHandler>,
}

impl FunctionTool {
    /// Create a tool from a closure.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> Result<serde_json::Value> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for FunctionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}
