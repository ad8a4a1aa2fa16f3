//! Chat backends: the service trait, request and reply types, and the
//! bundled HTTP providers.

#[cfg(feature = "openai")]
pub(crate) mod http;
#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "openrouter")]
pub mod openrouter;

#[cfg(feature = "openai")]
pub use openai::OpenAiChatBackend;
#[cfg(feature = "openrouter")]
pub use openrouter::OpenRouterBackend;

use async_trait::async_trait;

use crate::error::Result;
use crate::settings::ResolvedParams;
use crate::wire::{ChatResponse, WireMessage};

/// What a backend natively speaks; drives request shaping.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendCapabilities {
    /// True for the OpenAI API itself, which honors request parameters
    /// without a provider routing hint.
    pub openai_native: bool,
}

/// One outgoing chat-completion exchange, fully resolved.
///
/// `messages` is a private snapshot taken at send time; later transcript
/// edits never reach a request already in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    pub params: ResolvedParams,
}

impl BackendRequest {
    /// The JSON body: `model` and `messages` plus every resolved parameter.
    pub fn body(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": self.messages,
        });
        let obj = body.as_object_mut().expect("body is an object");
        for (key, value) in self.params.iter() {
            obj.insert(key.clone(), value.clone());
        }
        body
    }
}

/// A backend's answer to one request.
#[derive(Debug)]
pub enum BackendReply {
    /// Fully parsed chat response.
    Complete(ChatResponse),
    /// Raw streaming HTTP response. The continuation loop hands this back
    /// to the caller untouched; consuming it is the caller's business.
    Streamed(reqwest::Response),
}

/// A service that answers chat-completion requests.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Capability flags consulted while shaping requests.
    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::default()
    }

    /// Perform one exchange.
    async fn send(&self, request: BackendRequest) -> Result<BackendReply>;
}
