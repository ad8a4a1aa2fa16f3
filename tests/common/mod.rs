//! Shared test helpers and the mock backend.

use std::sync::Mutex;

use async_trait::async_trait;

use colloquy::backend::{BackendCapabilities, BackendReply, BackendRequest, ChatBackend};
use colloquy::error::Result;
use colloquy::wire::{ChatChoice, ChatResponse, Role, TokenUsage, WireMessage, WireToolCall};

/// A backend that returns canned replies and captures every request.
pub struct MockBackend {
    capabilities: BackendCapabilities,
    replies: Mutex<Vec<BackendReply>>,
    requests: Mutex<Vec<BackendRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            capabilities: BackendCapabilities::default(),
            replies: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a plain text reply.
    pub fn queue_text(&self, text: &str) {
        self.queue_response(text_response(text));
    }

    /// Queue a reply requesting a single tool call.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: &str) {
        self.queue_response(tool_call_response(vec![WireToolCall::function(id, name, args)]));
    }

    pub fn queue_response(&self, response: ChatResponse) {
        self.replies
            .lock()
            .unwrap()
            .push(BackendReply::Complete(response));
    }

    pub fn queue_reply(&self, reply: BackendReply) {
        self.replies.lock().unwrap().push(reply);
    }

    pub fn requests(&self) -> Vec<BackendRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<BackendRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    async fn send(&self, request: BackendRequest) -> Result<BackendReply> {
        self.requests.lock().unwrap().push(request);
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Ok(BackendReply::Complete(text_response("mock reply")));
        }
        Ok(replies.remove(0))
    }
}

/// A complete response carrying one plain assistant message.
pub fn text_response(text: &str) -> ChatResponse {
    ChatResponse {
        id: Some("resp-text".to_string()),
        model: Some("mock-model".to_string()),
        choices: vec![ChatChoice {
            index: 0,
            message: WireMessage::text(Role::Assistant, text),
            finish_reason: Some("stop".to_string()),
        }],
        usage: Some(TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 20,
            total_tokens: 30,
        }),
    }
}

/// A complete response carrying assistant tool calls and no content.
pub fn tool_call_response(calls: Vec<WireToolCall>) -> ChatResponse {
    ChatResponse {
        id: Some("resp-tools".to_string()),
        model: Some("mock-model".to_string()),
        choices: vec![ChatChoice {
            index: 0,
            message: WireMessage::assistant_with_calls(None, calls),
            finish_reason: Some("tool_calls".to_string()),
        }],
        usage: Some(TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
    }
}
