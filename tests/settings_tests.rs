//! Scope resolution: precedence, empty-value fallthrough, and request shaping.

use serde_json::json;

use colloquy::backend::BackendCapabilities;
use colloquy::error::ColloquyError;
use colloquy::settings::{
    resolve, CompletionScope, CompletionSettings, ResponseFormat, DEFAULT_MAX_COMPLETION_TOKENS,
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
};
use colloquy::tools::{FunctionTool, ToolFilter, ToolParameters, ToolRegistry};

fn no_tools() -> ToolRegistry {
    ToolRegistry::default()
}

fn registry_with(names: &[&str]) -> ToolRegistry {
    let mut registry = ToolRegistry::default();
    for name in names {
        registry.register(FunctionTool::new(
            *name,
            "A test tool",
            ToolParameters::empty(),
            |_args, _ctx| async move { Ok(json!(null)) },
        ));
    }
    registry
}

#[test]
fn instance_overrides_beat_every_scope() {
    let global = CompletionScope::root(
        CompletionSettings::builder()
            .model("global-model".to_string())
            .temperature(0.2)
            .seed(7_u64)
            .build(),
    )
    .shared();
    let class = CompletionScope::child_of(
        global,
        CompletionSettings::builder().temperature(0.5).build(),
    );
    let overrides = CompletionSettings::builder().temperature(0.9).build();

    let resolved = resolve(
        &overrides,
        &class,
        &no_tools(),
        &ToolFilter::Auto,
        false,
        BackendCapabilities::default(),
    )
    .unwrap();

    // Instance temperature wins; untouched fields come from the chain.
    assert_eq!(resolved.params.get("temperature"), Some(&json!(0.9)));
    assert_eq!(resolved.params.get("seed"), Some(&json!(7)));
    assert_eq!(resolved.model, "global-model");
}

#[test]
fn child_scope_beats_the_global_root() {
    let global = CompletionScope::root(
        CompletionSettings::builder()
            .model("global-model".to_string())
            .temperature(0.2)
            .seed(7_u64)
            .build(),
    )
    .shared();
    let class = CompletionScope::child_of(
        global,
        CompletionSettings::builder()
            .model("scope-model".to_string())
            .temperature(0.5)
            .build(),
    );

    let resolved = resolve(
        &CompletionSettings::default(),
        &class,
        &no_tools(),
        &ToolFilter::Auto,
        false,
        BackendCapabilities::default(),
    )
    .unwrap();

    // With no instance overrides the child scope wins over the root,
    // while fields only the root sets still show through.
    assert_eq!(resolved.model, "scope-model");
    assert_eq!(resolved.params.get("temperature"), Some(&json!(0.5)));
    assert_eq!(resolved.params.get("seed"), Some(&json!(7)));
}

#[test]
fn empty_values_fall_through_to_outer_scopes() {
    let global = CompletionScope::root(
        CompletionSettings::builder()
            .model("global-model".to_string())
            .stop_sequences(vec!["END".to_string()])
            .build(),
    )
    .shared();
    let class = CompletionScope::child_of(
        global,
        CompletionSettings::builder()
            .model(String::new())
            .stop_sequences(Vec::new())
            .build(),
    );

    let resolved = resolve(
        &CompletionSettings::default(),
        &class,
        &no_tools(),
        &ToolFilter::Auto,
        false,
        BackendCapabilities::default(),
    )
    .unwrap();

    assert_eq!(resolved.model, "global-model");
    assert_eq!(resolved.params.get("stop"), Some(&json!(["END"])));
}

#[test]
fn hard_defaults_fill_unset_fields() {
    let scope = CompletionScope::root(CompletionSettings::default());

    let resolved = resolve(
        &CompletionSettings::default(),
        &scope,
        &no_tools(),
        &ToolFilter::Auto,
        false,
        BackendCapabilities::default(),
    )
    .unwrap();

    assert_eq!(resolved.model, DEFAULT_MODEL);
    assert_eq!(
        resolved.params.get("temperature"),
        Some(&json!(DEFAULT_TEMPERATURE))
    );
    assert_eq!(
        resolved.params.get("max_tokens"),
        Some(&json!(DEFAULT_MAX_TOKENS))
    );
    assert_eq!(
        resolved.params.get("max_completion_tokens"),
        Some(&json!(DEFAULT_MAX_COMPLETION_TOKENS))
    );
    // Parameters without a hard default stay off the wire.
    assert!(resolved.params.get("top_p").is_none());
    assert!(resolved.params.get("seed").is_none());
    assert!(!resolved.json_mode);
}

#[test]
fn named_filter_selects_a_subset_in_registration_order() {
    let registry = registry_with(&["alpha", "beta", "gamma"]);
    let scope = CompletionScope::root(CompletionSettings::default());

    let resolved = resolve(
        &CompletionSettings::default(),
        &scope,
        &registry,
        &ToolFilter::named(["gamma", "alpha"]),
        false,
        BackendCapabilities::default(),
    )
    .unwrap();

    let tools = resolved.params.get("tools").unwrap().as_array().unwrap();
    let names: Vec<&str> = tools
        .iter()
        .map(|def| def["function"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["alpha", "gamma"]);
}

#[test]
fn named_filter_rejects_undeclared_tools() {
    let registry = registry_with(&["alpha"]);
    let scope = CompletionScope::root(CompletionSettings::default());

    let err = resolve(
        &CompletionSettings::default(),
        &scope,
        &registry,
        &ToolFilter::named(["alpha", "missing"]),
        false,
        BackendCapabilities::default(),
    )
    .unwrap_err();

    assert!(matches!(err, ColloquyError::UndeclaredTool(name) if name == "missing"));
}

#[test]
fn disabled_filter_sends_no_tools() {
    let registry = registry_with(&["alpha"]);
    let scope = CompletionScope::root(CompletionSettings::default());

    let resolved = resolve(
        &CompletionSettings::builder()
            .tool_choice(json!("auto"))
            .build(),
        &scope,
        &registry,
        &ToolFilter::Disabled,
        false,
        BackendCapabilities::default(),
    )
    .unwrap();

    assert!(resolved.params.get("tools").is_none());
    // tool_choice is meaningless without a tool list.
    assert!(resolved.params.get("tool_choice").is_none());
}

#[test]
fn tool_choice_travels_with_the_tool_list() {
    let registry = registry_with(&["alpha"]);
    let scope = CompletionScope::root(CompletionSettings::default());

    let resolved = resolve(
        &CompletionSettings::builder()
            .tool_choice(json!("required"))
            .build(),
        &scope,
        &registry,
        &ToolFilter::Auto,
        false,
        BackendCapabilities::default(),
    )
    .unwrap();

    assert!(resolved.params.get("tools").is_some());
    assert_eq!(resolved.params.get("tool_choice"), Some(&json!("required")));
}

#[test]
fn json_schema_format_rides_the_wire_strict() {
    let scope = CompletionScope::root(CompletionSettings::default());
    let overrides = CompletionSettings::builder()
        .response_format(ResponseFormat::JsonSchema {
            name: "weather".to_string(),
            schema: json!({"type": "object"}),
        })
        .build();

    let resolved = resolve(
        &overrides,
        &scope,
        &no_tools(),
        &ToolFilter::Auto,
        false,
        BackendCapabilities { openai_native: true },
    )
    .unwrap();

    assert!(resolved.json_mode);
    assert_eq!(
        resolved.params.get("response_format"),
        Some(&json!({
            "type": "json_schema",
            "json_schema": {
                "name": "weather",
                "schema": {"type": "object"},
                "strict": true,
            }
        }))
    );
}

#[test]
fn scope_budget_feeds_the_tool_call_ceiling() {
    let scope = CompletionScope::root(
        CompletionSettings::builder().max_tool_calls(3_u32).build(),
    );

    let resolved = resolve(
        &CompletionSettings::default(),
        &scope,
        &no_tools(),
        &ToolFilter::Auto,
        false,
        BackendCapabilities::default(),
    )
    .unwrap();

    assert_eq!(resolved.max_tool_calls, 3);
    // The budget shapes the loop, not the request body.
    assert!(resolved.params.get("max_tool_calls").is_none());
}
