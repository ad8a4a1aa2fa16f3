//! OpenRouter backend, speaking the OpenAI-compatible wire format.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::debug;

use super::http::{bearer_headers, shared_client, status_to_error};
use super::{BackendCapabilities, BackendReply, BackendRequest, ChatBackend};
use crate::error::{ColloquyError, Result};
use crate::wire::ChatResponse;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

pub struct OpenRouterBackend {
    api_key: String,
    base_url: String,
    referer: Option<String>,
    title: Option<String>,
}

impl OpenRouterBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            referer: None,
            title: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Identify the calling app in OpenRouter's rankings via the
    /// `HTTP-Referer` and `X-Title` headers.
    pub fn with_app(mut self, referer: impl Into<String>, title: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self.title = Some(title.into());
        self
    }

    /// Read `OPENROUTER_API_KEY` (and optionally `OPENROUTER_BASE_URL`)
    /// from the environment, loading a `.env` file when present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let api_key = std::env::var("OPENROUTER_API_KEY").map_err(|_| {
            ColloquyError::Configuration("OPENROUTER_API_KEY is not set".to_string())
        })?;
        let mut backend = Self::new(api_key);
        if let Ok(url) = std::env::var("OPENROUTER_BASE_URL") {
            backend.base_url = url;
        }
        Ok(backend)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = bearer_headers(&self.api_key);
        if let Some(referer) = &self.referer {
            if let Ok(val) = HeaderValue::from_str(referer) {
                headers.insert("HTTP-Referer", val);
            }
        }
        if let Some(title) = &self.title {
            if let Ok(val) = HeaderValue::from_str(title) {
                headers.insert("X-Title", val);
            }
        }
        headers
    }
}

#[async_trait]
impl ChatBackend for OpenRouterBackend {
    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            openai_native: false,
        }
    }

    async fn send(&self, request: BackendRequest) -> Result<BackendReply> {
        let url = format!("{}/chat/completions", self.base_url);
        let streaming = request
            .params
            .get("stream")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        debug!(model = %request.model, streaming, "OpenRouter chat completion");

        let resp = shared_client()
            .post(&url)
            .headers(self.headers())
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

impl std::fmt::Debug for OpenRouterBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterBackend")
            .field("base_url", &self.base_url)
            .field("referer", &self.referer)
            .field("title", &self.title)
            .field("api_key", &"..")
            .finish()
    }
}
