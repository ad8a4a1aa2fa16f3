//! Request hooks.
//!
//! Hooks run once per attempt, in scope order from the global root down to
//! the per-call hook. Each hook sees the outgoing messages and parameters
//! and may mutate them in place; a returned patch is shallow-merged into
//! the parameters immediately, so later hooks observe earlier edits.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::settings::ResolvedParams;
use crate::wire::WireMessage;

/// A shallow parameter patch returned by a hook. Keys replace existing
/// request parameters whole; an empty patch is a no-op.
pub type ParamPatch = Map<String, Value>;

/// Read-only facts about the call a hook is shaping.
#[derive(Debug, Clone)]
pub struct ContextMetadata {
    request_id: String,
    model: String,
    attempt: u32,
    json_mode: bool,
}

impl ContextMetadata {
    pub(crate) fn new(request_id: String, model: String, attempt: u32, json_mode: bool) -> Self {
        Self {
            request_id,
            model,
            attempt,
            json_mode,
        }
    }

    /// Identifier shared by every attempt of one completion call.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// 1-based attempt counter within the continuation loop.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn json_mode(&self) -> bool {
        self.json_mode
    }
}

/// Mutable view of one outgoing request, handed to each hook in turn.
#[derive(Debug)]
pub struct CompletionContext {
    /// Messages about to be sent, already in wire form.
    pub messages: Vec<WireMessage>,
    /// Resolved request parameters; hook patches land here.
    pub params: ResolvedParams,
    metadata: ContextMetadata,
}

impl CompletionContext {
    pub(crate) fn new(
        messages: Vec<WireMessage>,
        params: ResolvedParams,
        metadata: ContextMetadata,
    ) -> Self {
        Self {
            messages,
            params,
            metadata,
        }
    }

    pub fn metadata(&self) -> &ContextMetadata {
        &self.metadata
    }
}

/// Observes and adjusts a request before it reaches the backend.
#[async_trait]
pub trait RequestHook: Send + Sync {
    async fn on_request(&self, context: &mut CompletionContext) -> Option<ParamPatch>;
}

/// A hook backed by a plain closure, for the common synchronous case.
pub struct FnHook {
    f: Arc<dyn Fn(&mut CompletionContext) -> Option<ParamPatch> + Send + Sync>,
}

impl FnHook {
    pub fn new(
        f: impl Fn(&mut CompletionContext) -> Option<ParamPatch> + Send + Sync + 'static,
    ) -> Self {
        Self { f: Arc::new(f) }
    }
}

#[async_trait]
impl RequestHook for FnHook {
    async fn on_request(&self, context: &mut CompletionContext) -> Option<ParamPatch> {
        (self.f)(context)
    }
}

impl std::fmt::Debug for FnHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHook").finish_non_exhaustive()
    }
}

/// Run the hook chain over `context`, merging each returned patch before
/// the next hook fires.
pub(crate) async fn run_hooks(hooks: &[Arc<dyn RequestHook>], context: &mut CompletionContext) {
    for (index, hook) in hooks.iter().enumerate() {
        if let Some(patch) = hook.on_request(context).await {
            if !patch.is_empty() {
                debug!(
                    request_id = %context.metadata.request_id,
                    hook = index,
                    keys = patch.len(),
                    "merging hook patch"
                );
            }
            context.params.merge_patch(patch);
        }
    }
}
