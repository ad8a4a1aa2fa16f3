//! Convenience re-exports for common use.

pub use crate::backend::{BackendCapabilities, BackendReply, BackendRequest, ChatBackend};
#[cfg(feature = "openai")]
pub use crate::backend::OpenAiChatBackend;
#[cfg(feature = "openrouter")]
pub use crate::backend::OpenRouterBackend;
pub use crate::error::{ColloquyError, Result};
pub use crate::hooks::{CompletionContext, FnHook, ParamPatch, RequestHook};
pub use crate::session::{ChatOutcome, ChatSession, CompletionCall, Reply};
pub use crate::settings::{CompletionScope, CompletionSettings, ResponseFormat};
pub use crate::tools::{FunctionTool, Tool, ToolArguments, ToolFilter, ToolParameters};
pub use crate::transcript::{Transcript, TranscriptEntry};
pub use crate::wire::{ChatResponse, Role, TokenUsage, WireMessage};
