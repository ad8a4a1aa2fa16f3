//! OpenAI Chat Completions backend.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::http::{bearer_headers, shared_client, status_to_error};
use super::{BackendCapabilities, BackendReply, BackendRequest, ChatBackend};
use crate::error::{ColloquyError, Result};
use crate::wire::ChatResponse;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiChatBackend {
    api_key: String,
    base_url: String,
}

impl OpenAiChatBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Read `OPENAI_API_KEY` (and optionally `OPENAI_BASE_URL`) from the
    /// environment, loading a `.env` file when present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ColloquyError::Configuration("OPENAI_API_KEY is not set".to_string()))?;
        let mut backend = Self::new(api_key);
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            backend.base_url = url;
        }
        Ok(backend)
    }
}

#[async_trait]
impl ChatBackend for OpenAiChatBackend {
    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities { openai_native: true }
    }

    async fn send(&self, request: BackendRequest) -> Result<BackendReply> {
        let url = format!("{}/chat/completions", self.base_url);
        let streaming = request
            .params
            .get("stream")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        debug!(model = %request.model, streaming, "OpenAI chat completion");

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&request.body())
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        if streaming {
            return Ok(BackendReply::Streamed(resp));
        }

        let data: ChatResponse = resp.json().await?;
        Ok(BackendReply::Complete(data))
    }
}

impl std::fmt::Debug for OpenAiChatBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatBackend")
            .field("base_url", &self.base_url)
            .field("api_key", &"..")
            .finish()
    }
}
