//! Completion settings and the layered configuration scopes.
//!
//! Settings are plain all-optional value structs. Scopes form an explicit
//! chain (instance overrides, then a scope chain ending at the global root,
//! then hard defaults); resolution walks the chain with "first non-empty
//! wins" per field. See [`resolve`] for the per-request assembly rules.

pub mod resolve;

pub use resolve::{resolve, ResolvedParams, ResolvedRequest};

use std::collections::HashMap;
use std::sync::Arc;

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hooks::RequestHook;

/// Model used when no scope sets one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Sampling temperature used when no scope sets one.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
/// Response token ceiling used when no scope sets one.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
/// Completion token ceiling used when no scope sets one.
pub const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 16_384;
/// Tool call budget used when no scope sets one.
pub const DEFAULT_MAX_TOOL_CALLS: u32 = 25;

/// Settings controlling one chat completion request.
///
/// Every field is optional; absent fields fall through to the next scope
/// during resolution. An empty string or empty collection counts as absent.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, Default, PartialEq)]
pub struct CompletionSettings {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub max_completion_tokens: Option<u32>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub top_a: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
    pub repetition_penalty: Option<f64>,
    pub logit_bias: Option<HashMap<String, f64>>,
    pub logprobs: Option<bool>,
    pub top_logprobs: Option<u32>,
    pub seed: Option<u64>,
    pub stop_sequences: Option<Vec<String>>,
    pub response_format: Option<ResponseFormat>,
    pub prediction: Option<String>,
    pub provider: Option<Value>,
    pub tool_choice: Option<Value>,
    pub min_p: Option<f64>,
    pub max_tool_calls: Option<u32>,
}

impl CompletionSettings {
    /// The hard defaults applied after every scope has been consulted.
    ///
    /// Only a fixed subset of parameters carries a default; everything else
    /// stays absent when no scope sets it.
    pub fn hard_defaults() -> Self {
        Self {
            model: Some(DEFAULT_MODEL.to_string()),
            temperature: Some(DEFAULT_TEMPERATURE),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            max_completion_tokens: Some(DEFAULT_MAX_COMPLETION_TOKENS),
            max_tool_calls: Some(DEFAULT_MAX_TOOL_CALLS),
            ..Self::default()
        }
    }

    /// Overlay `self` on `fallback`: non-empty fields of `self` win, empty
    /// fields fall through.
    pub fn with_fallback(&self, fallback: &CompletionSettings) -> CompletionSettings {
        fn pick<T: Clone>(
            upper: &Option<T>,
            lower: &Option<T>,
            is_empty: impl Fn(&T) -> bool,
        ) -> Option<T> {
            match upper {
                Some(v) if !is_empty(v) => Some(v.clone()),
                _ => lower.clone().filter(|v| !is_empty(v)),
            }
        }
        let scalar = |_: &f64| false;

        CompletionSettings {
            model: pick(&self.model, &fallback.model, String::is_empty),
            temperature: pick(&self.temperature, &fallback.temperature, scalar),
            max_tokens: pick(&self.max_tokens, &fallback.max_tokens, |_| false),
            max_completion_tokens: pick(
                &self.max_completion_tokens,
                &fallback.max_completion_tokens,
                |_| false,
            ),
            top_p: pick(&self.top_p, &fallback.top_p, scalar),
            top_k: pick(&self.top_k, &fallback.top_k, |_| false),
            top_a: pick(&self.top_a, &fallback.top_a, scalar),
            frequency_penalty: pick(&self.frequency_penalty, &fallback.frequency_penalty, scalar),
            presence_penalty: pick(&self.presence_penalty, &fallback.presence_penalty, scalar),
            repetition_penalty: pick(
                &self.repetition_penalty,
                &fallback.repetition_penalty,
                scalar,
            ),
            logit_bias: pick(&self.logit_bias, &fallback.logit_bias, HashMap::is_empty),
            logprobs: pick(&self.logprobs, &fallback.logprobs, |_| false),
            top_logprobs: pick(&self.top_logprobs, &fallback.top_logprobs, |_| false),
            seed: pick(&self.seed, &fallback.seed, |_| false),
            stop_sequences: pick(&self.stop_sequences, &fallback.stop_sequences, Vec::is_empty),
            response_format: pick(&self.response_format, &fallback.response_format, |_| false),
            prediction: pick(&self.prediction, &fallback.prediction, String::is_empty),
            provider: pick(&self.provider, &fallback.provider, value_is_empty),
            tool_choice: pick(&self.tool_choice, &fallback.tool_choice, value_is_empty),
            min_p: pick(&self.min_p, &fallback.min_p, scalar),
            max_tool_calls: pick(&self.max_tool_calls, &fallback.max_tool_calls, |_| false),
        }
    }
}

/// Whether a JSON value counts as empty for fallback purposes.
fn value_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Requested response format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    JsonObject,
    JsonSchema { name: String, schema: Value },
}

impl ResponseFormat {
    /// Whether this format asks the model for JSON output.
    pub fn requests_json(&self) -> bool {
        matches!(self, Self::JsonObject | Self::JsonSchema { .. })
    }

    /// The wire value sent under the `response_format` request key.
    pub fn wire_value(&self) -> Value {
        match self {
            Self::Text => serde_json::json!({"type": "text"}),
            Self::JsonObject => serde_json::json!({"type": "json_object"}),
            Self::JsonSchema { name, schema } => serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": name,
                    "schema": schema,
                    "strict": true,
                }
            }),
        }
    }
}

/// One configuration scope with an explicit parent reference.
///
/// The root scope is the global configuration; children refine it. A scope
/// may also carry the hook for its level of the chain.
pub struct CompletionScope {
    settings: CompletionSettings,
    hook: Option<Arc<dyn RequestHook>>,
    parent: Option<Arc<CompletionScope>>,
}

impl CompletionScope {
    /// Create a root (global) scope.
    pub fn root(settings: CompletionSettings) -> Self {
        Self {
            settings,
            hook: None,
            parent: None,
        }
    }

    /// Create a scope refining `parent`.
    pub fn child_of(parent: Arc<CompletionScope>, settings: CompletionSettings) -> Self {
        Self {
            settings,
            hook: None,
            parent: Some(parent),
        }
    }

    /// Attach this scope's hook.
    pub fn with_hook(mut self, hook: impl RequestHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Wrap in an [`Arc`] for sharing with sessions and child scopes.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }

    pub fn hook(&self) -> Option<&Arc<dyn RequestHook>> {
        self.hook.as_ref()
    }

    /// Settings folded over the whole chain (nearest scope wins per field).
    pub fn chain_settings(&self) -> CompletionSettings {
        match &self.parent {
            Some(parent) => self.settings.with_fallback(&parent.chain_settings()),
            None => self.settings.clone(),
        }
    }

    /// Hooks from the root down to this scope, in execution order.
    pub fn chain_hooks(&self) -> Vec<Arc<dyn RequestHook>> {
        let mut hooks = match &self.parent {
            Some(parent) => parent.chain_hooks(),
            None => Vec::new(),
        };
        if let Some(hook) = &self.hook {
            hooks.push(Arc::clone(hook));
        }
        hooks
    }
}

impl std::fmt::Debug for CompletionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionScope")
            .field("settings", &self.settings)
            .field("hook", &self.hook.as_ref().map(|_| ".."))
            .field("parent", &self.parent)
            .finish()
    }
}
