//! Per-call options and the completion result types.

use bon::Builder;
use serde_json::Value;

use crate::settings::CompletionSettings;
use crate::tools::ToolFilter;
use crate::wire::{ChatResponse, TokenUsage, WireMessage};

/// Options for one completion call.
///
/// Everything is optional; `CompletionCall::default()` asks for a plain
/// text reply with every registered tool available.
#[derive(Debug, Clone, Builder)]
pub struct CompletionCall {
    /// Per-call parameter overrides, highest precedence in resolution.
    pub params: Option<CompletionSettings>,
    /// Ask for JSON and parse the reply.
    #[builder(default)]
    pub json: bool,
    /// Return the full parsed response instead of extracted text.
    #[builder(default)]
    pub raw: bool,
    /// Model override, shorthand that beats `params.model`.
    pub model: Option<String>,
    /// Append the final assistant reply to the transcript.
    #[builder(default = true)]
    pub save_response: bool,
    /// Send these messages instead of the adapted transcript. Used until
    /// the first continuation appends to the transcript.
    pub messages_override: Option<Vec<WireMessage>>,
    /// Which declared tools this call exposes.
    #[builder(default)]
    pub tool_filter: ToolFilter,
    /// Tool call budget override for this call.
    pub max_tool_calls: Option<u32>,
    /// Deprecated: continuation is always automatic. Setting this only
    /// produces a warning.
    pub auto_continue: Option<bool>,
}

impl Default for CompletionCall {
    fn default() -> Self {
        Self {
            params: None,
            json: false,
            raw: false,
            model: None,
            save_response: true,
            messages_override: None,
            tool_filter: ToolFilter::Auto,
            max_tool_calls: None,
            auto_continue: None,
        }
    }
}

impl CompletionCall {
    /// A plain text completion with defaults.
    pub fn text() -> Self {
        Self::default()
    }

    /// A JSON-mode completion with defaults.
    pub fn json_reply() -> Self {
        Self {
            json: true,
            ..Self::default()
        }
    }
}

/// The shape a completion resolved to.
#[derive(Debug)]
pub enum Reply {
    /// Plain assistant text, trimmed.
    Text(String),
    /// Parsed JSON payload.
    Json(Value),
    /// The full parsed response, untouched.
    Raw(ChatResponse),
    /// A streaming response handed back unconsumed.
    Streamed(reqwest::Response),
}

impl Reply {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_streamed(&self) -> bool {
        matches!(self, Self::Streamed(_))
    }
}

/// Result of one completion call.
#[derive(Debug)]
pub struct ChatOutcome {
    /// What the call resolved to, per the requested return mode.
    pub reply: Reply,
    /// The last parsed backend response of this call, when one exists.
    /// Streamed replies carry no parsed response.
    pub response: Option<ChatResponse>,
    /// Token usage accumulated across every attempt of this call.
    pub usage: TokenUsage,
}

impl ChatOutcome {
    pub fn text(&self) -> Option<&str> {
        self.reply.text()
    }

    pub fn json(&self) -> Option<&Value> {
        self.reply.json()
    }
}
