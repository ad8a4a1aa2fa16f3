//! Per-request parameter resolution.
//!
//! Folds the scope chain into one effective settings value, then assembles
//! the wire-shaped parameter map the backend body is built from. Hooks
//! patch the map after assembly; nothing here is global or cached.

use serde_json::{Map, Value};
use tracing::debug;

use crate::backend::BackendCapabilities;
use crate::error::Result;
use crate::settings::{
    CompletionScope, CompletionSettings, ResponseFormat, DEFAULT_MAX_TOOL_CALLS, DEFAULT_MODEL,
};
use crate::tools::{ToolFilter, ToolRegistry};

/// Wire-shaped request parameters, keyed by provider field name.
///
/// This is the form hooks receive and patch. Keys map 1:1 onto the request
/// body; `model` and `messages` are carried separately.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ResolvedParams(Map<String, Value>);

impl ResolvedParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Shallow-merge a hook patch: patch keys replace existing keys whole,
    /// everything else is untouched. An empty patch is a no-op.
    pub fn merge_patch(&mut self, patch: Map<String, Value>) {
        for (key, value) in patch {
            self.0.insert(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ResolvedParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Everything one attempt needs besides the transcript.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub model: String,
    pub params: ResolvedParams,
    pub max_tool_calls: u32,
    /// JSON extraction applies to the reply, whether requested directly or
    /// implied by the response format.
    pub json_mode: bool,
}

/// Resolve one request against the scope chain and shape it for the wire.
///
/// Precedence per field is instance overrides, then the scope chain nearest
/// first, then hard defaults; empty values fall through. Tool selection
/// fails with [`UndeclaredTool`](crate::ColloquyError::UndeclaredTool)
/// before any network traffic when `filter` names a tool the registry does
/// not hold.
pub fn resolve(
    overrides: &CompletionSettings,
    scope: &CompletionScope,
    tools: &ToolRegistry,
    filter: &ToolFilter,
    json_requested: bool,
    capabilities: BackendCapabilities,
) -> Result<ResolvedRequest> {
    let effective = overrides
        .with_fallback(&scope.chain_settings())
        .with_fallback(&CompletionSettings::hard_defaults());

    let model = effective
        .model
        .clone()
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let max_tool_calls = effective.max_tool_calls.unwrap_or(DEFAULT_MAX_TOOL_CALLS);
    let json_mode = json_requested
        || effective
            .response_format
            .as_ref()
            .is_some_and(ResponseFormat::requests_json);

    let mut params = ResolvedParams::new();
    if let Some(temperature) = effective.temperature {
        params.insert("temperature", serde_json::json!(temperature));
    }
    if let Some(max_tokens) = effective.max_tokens {
        params.insert("max_tokens", serde_json::json!(max_tokens));
    }
    if let Some(max_completion_tokens) = effective.max_completion_tokens {
        params.insert(
            "max_completion_tokens",
            serde_json::json!(max_completion_tokens),
        );
    }
    if let Some(top_p) = effective.top_p {
        params.insert("top_p", serde_json::json!(top_p));
    }
    if let Some(top_k) = effective.top_k {
        params.insert("top_k", serde_json::json!(top_k));
    }
    if let Some(top_a) = effective.top_a {
        params.insert("top_a", serde_json::json!(top_a));
    }
    if let Some(frequency_penalty) = effective.frequency_penalty {
        params.insert("frequency_penalty", serde_json::json!(frequency_penalty));
    }
    if let Some(presence_penalty) = effective.presence_penalty {
        params.insert("presence_penalty", serde_json::json!(presence_penalty));
    }
    if let Some(repetition_penalty) = effective.repetition_penalty {
        params.insert("repetition_penalty", serde_json::json!(repetition_penalty));
    }
    if let Some(logit_bias) = &effective.logit_bias {
        params.insert("logit_bias", serde_json::json!(logit_bias));
    }
    if let Some(logprobs) = effective.logprobs {
        params.insert("logprobs", serde_json::json!(logprobs));
    }
    if let Some(top_logprobs) = effective.top_logprobs {
        params.insert("top_logprobs", serde_json::json!(top_logprobs));
    }
    if let Some(seed) = effective.seed {
        params.insert("seed", serde_json::json!(seed));
    }
    if let Some(stop) = &effective.stop_sequences {
        params.insert("stop", serde_json::json!(stop));
    }
    if let Some(min_p) = effective.min_p {
        params.insert("min_p", serde_json::json!(min_p));
    }
    if let Some(format) = &effective.response_format {
        params.insert("response_format", format.wire_value());
    }
    if let Some(prediction) = &effective.prediction {
        params.insert(
            "prediction",
            serde_json::json!({"type": "content", "content": prediction}),
        );
    }
    if let Some(provider) = &effective.provider {
        params.insert("provider", provider.clone());
    }

    if json_mode && !capabilities.openai_native {
        require_parameters(&mut params);
        if !params.contains("response_format") {
            params.insert("response_format", serde_json::json!({"type": "json_object"}));
        }
    }

    let definitions = match filter {
        ToolFilter::Disabled => Vec::new(),
        ToolFilter::Auto => tools.definitions(),
        ToolFilter::Named(names) => tools.definitions_for(names)?,
    };
    if !definitions.is_empty() {
        params.insert("tools", Value::Array(definitions));
        // tool_choice only travels with a tool list
        if let Some(tool_choice) = &effective.tool_choice {
            params.insert("tool_choice", tool_choice.clone());
        }
    }

    debug!(
        model = %model,
        params = params.len(),
        json_mode,
        max_tool_calls,
        "resolved completion request"
    );

    Ok(ResolvedRequest {
        model,
        params,
        max_tool_calls,
        json_mode,
    })
}

/// Merge `require_parameters: true` into the provider routing object,
/// creating it when absent.
fn require_parameters(params: &mut ResolvedParams) {
    match params.remove("provider") {
        Some(Value::Object(mut map)) => {
            map.insert("require_parameters".to_string(), Value::Bool(true));
            params.insert("provider", Value::Object(map));
        }
        other => {
            if other.is_some() {
                debug!("replacing non-object provider value with routing hint");
            }
            params.insert(
                "provider",
                serde_json::json!({"require_parameters": true}),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendCapabilities;
    use crate::settings::CompletionScope;

    fn resolve_plain(
        overrides: &CompletionSettings,
        scope: &CompletionScope,
        json: bool,
        openai_native: bool,
    ) -> ResolvedRequest {
        resolve(
            overrides,
            scope,
            &ToolRegistry::new(),
            &ToolFilter::Disabled,
            json,
            BackendCapabilities { openai_native },
        )
        .unwrap()
    }

    #[test]
    fn merge_patch_replaces_whole_keys() {
        let mut params = ResolvedParams::new();
        params.insert("temperature", serde_json::json!(0.2));
        params.insert("provider", serde_json::json!({"order": ["a"]}));

        let mut patch = Map::new();
        patch.insert("temperature".to_string(), serde_json::json!(0.9));
        patch.insert("provider".to_string(), serde_json::json!({"allow": true}));
        params.merge_patch(patch);

        assert_eq!(params.get("temperature"), Some(&serde_json::json!(0.9)));
        assert_eq!(
            params.get("provider"),
            Some(&serde_json::json!({"allow": true}))
        );
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut params = ResolvedParams::new();
        params.insert("seed", serde_json::json!(7));
        let before = params.clone();
        params.merge_patch(Map::new());
        assert_eq!(params, before);
    }

    #[test]
    fn prediction_wraps_into_content_object() {
        let overrides = CompletionSettings::builder()
            .prediction("let x = 1;".to_string())
            .build();
        let scope = CompletionScope::root(CompletionSettings::default());
        let resolved = resolve_plain(&overrides, &scope, false, true);
        assert_eq!(
            resolved.params.get("prediction"),
            Some(&serde_json::json!({"type": "content", "content": "let x = 1;"}))
        );
    }

    #[test]
    fn empty_prediction_is_absent() {
        let overrides = CompletionSettings::builder().prediction(String::new()).build();
        let scope = CompletionScope::root(CompletionSettings::default());
        let resolved = resolve_plain(&overrides, &scope, false, true);
        assert!(!resolved.params.contains("prediction"));
    }

    #[test]
    fn json_mode_injects_provider_hint_off_openai() {
        let overrides = CompletionSettings::default();
        let scope = CompletionScope::root(CompletionSettings::default());
        let resolved = resolve_plain(&overrides, &scope, true, false);
        assert_eq!(
            resolved.params.get("provider"),
            Some(&serde_json::json!({"require_parameters": true}))
        );
        assert_eq!(
            resolved.params.get("response_format"),
            Some(&serde_json::json!({"type": "json_object"}))
        );
    }

    #[test]
    fn json_mode_merges_hint_into_existing_provider() {
        let overrides = CompletionSettings::builder()
            .provider(serde_json::json!({"order": ["openrouter"]}))
            .build();
        let scope = CompletionScope::root(CompletionSettings::default());
        let resolved = resolve_plain(&overrides, &scope, true, false);
        assert_eq!(
            resolved.params.get("provider"),
            Some(&serde_json::json!({"order": ["openrouter"], "require_parameters": true}))
        );
    }

    #[test]
    fn json_mode_leaves_openai_requests_alone() {
        let overrides = CompletionSettings::default();
        let scope = CompletionScope::root(CompletionSettings::default());
        let resolved = resolve_plain(&overrides, &scope, true, true);
        assert!(!resolved.params.contains("provider"));
        assert!(!resolved.params.contains("response_format"));
        assert!(resolved.json_mode);
    }

    #[test]
    fn response_format_implies_json_mode() {
        let overrides = CompletionSettings::builder()
            .response_format(ResponseFormat::JsonObject)
            .build();
        let scope = CompletionScope::root(CompletionSettings::default());
        let resolved = resolve_plain(&overrides, &scope, false, true);
        assert!(resolved.json_mode);
    }
}
