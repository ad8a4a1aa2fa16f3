//! Conversational sessions: the transcript owner and the call entry point.

mod call;
mod continuation;
mod extract;

pub use call::{ChatOutcome, CompletionCall, Reply};

use std::sync::Arc;

use crate::backend::ChatBackend;
use crate::error::Result;
use crate::hooks::RequestHook;
use crate::settings::{CompletionScope, CompletionSettings};
use crate::tools::{Tool, ToolRegistry};
use crate::transcript::{Transcript, TranscriptEntry};

/// One conversation: a transcript, its declared tools, and the backend
/// that answers.
///
/// A session runs one call at a time; the `&mut self` receiver on
/// [`chat_completion`](Self::chat_completion) keeps attempts sequential.
/// Continuations append assistant and tool turns to the transcript as
/// they happen.
pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    scope: Arc<CompletionScope>,
    overrides: CompletionSettings,
    hook: Option<Arc<dyn RequestHook>>,
    transcript: Transcript,
    tools: ToolRegistry,
}

impl ChatSession {
    /// Create a session over `backend` with an empty root scope.
    pub fn new(backend: impl ChatBackend + 'static) -> Self {
        Self::with_shared_backend(Arc::new(backend))
    }

    /// Create a session sharing an already-wrapped backend.
    pub fn with_shared_backend(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            scope: CompletionScope::root(CompletionSettings::default()).shared(),
            overrides: CompletionSettings::default(),
            hook: None,
            transcript: Transcript::new(),
            tools: ToolRegistry::new(),
        }
    }

    /// Resolve settings against `scope` instead of an empty root.
    pub fn with_scope(mut self, scope: Arc<CompletionScope>) -> Self {
        self.scope = scope;
        self
    }

    /// Session-level setting overrides; these beat every scope.
    pub fn with_settings(mut self, settings: CompletionSettings) -> Self {
        self.overrides = settings;
        self
    }

    /// Attach the session's hook, which runs last in the chain.
    pub fn with_hook(mut self, hook: impl RequestHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Declare a tool the model may call.
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.register(tool);
        self
    }

    /// Seed the transcript with a system turn.
    pub fn with_system(mut self, text: impl Into<String>) -> Self {
        self.push_system(text);
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn tools_mut(&mut self) -> &mut ToolRegistry {
        &mut self.tools
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.overrides
    }

    pub fn settings_mut(&mut self) -> &mut CompletionSettings {
        &mut self.overrides
    }

    /// Append one transcript entry.
    pub fn push(&mut self, entry: TranscriptEntry) {
        self.transcript.push(entry);
    }

    pub fn push_system(&mut self, text: impl Into<String>) {
        self.transcript.push(TranscriptEntry::system(text));
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.transcript.push(TranscriptEntry::user(text));
    }

    /// Run one completion call against the current transcript.
    pub async fn chat_completion(&mut self, call: CompletionCall) -> Result<ChatOutcome> {
        continuation::run(self, call).await
    }

    /// Plain text completion with default options.
    pub async fn complete(&mut self) -> Result<ChatOutcome> {
        self.chat_completion(CompletionCall::default()).await
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("scope", &self.scope)
            .field("overrides", &self.overrides)
            .field("hook", &self.hook.as_ref().map(|_| ".."))
            .field("transcript", &self.transcript.len())
            .field("tools", &self.tools)
            .finish()
    }
}
