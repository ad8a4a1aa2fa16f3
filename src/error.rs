//! Error types for colloquy.

use thiserror::Error;

/// Primary error type for all colloquy operations.
#[derive(Error, Debug)]
pub enum ColloquyError {
    /// The transcript (or override message list) had nothing to send.
    #[error("empty transcript: no messages to send")]
    EmptyTranscript,

    /// A tool name was requested that is not in the registry.
    #[error("undeclared tool '{0}'")]
    UndeclaredTool(String),

    /// Tool call arguments could not be decoded as a JSON object.
    #[error("malformed arguments for tool '{tool}': {reason}")]
    MalformedToolArguments { tool: String, reason: String },

    /// Response content could not be interpreted as requested.
    #[error("response parse failure: {0}")]
    ResponseParse(String),

    /// The backend rejected the request outright.
    #[error("backend rejected request (status {status}): {message}")]
    BackendRequest { status: u16, message: String },

    /// A tool handler failed while executing.
    #[error("tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ColloquyError {
    /// Create a backend rejection error.
    pub fn backend(status: u16, message: impl Into<String>) -> Self {
        Self::BackendRequest {
            status,
            message: message.into(),
        }
    }

    /// Create a tool execution error.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ColloquyError>;
