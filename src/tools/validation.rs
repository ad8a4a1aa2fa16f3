//! Advisory checks of tool-call arguments against the declared schema.
//!
//! Dispatch never rejects on schema grounds; divergences are collected as
//! notes and logged so tool authors can tighten schemas or prompts.

/// Collect every top-level divergence between `args` and `schema`: argument
/// shape, required field presence, and property types. Empty means clean.
pub(crate) fn schema_notes(args: &serde_json::Value, schema: &serde_json::Value) -> Vec<String> {
    let mut notes = Vec::new();

    if let Some(schema_type) = schema.get("type").and_then(|v| v.as_str()) {
        if schema_type == "object" && !args.is_object() {
            notes.push(format!(
                "expected object arguments, got {}",
                json_type_name(args)
            ));
            return notes;
        }
    }

    let obj = match args.as_object() {
        Some(obj) => obj,
        None => return notes,
    };

    if let Some(required) = schema.get("required").and_then(|v| v.as_array()) {
        for field in required {
            if let Some(name) = field.as_str() {
                if !obj.contains_key(name) {
                    notes.push(format!("missing required field '{name}'"));
                }
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(|v| v.as_object()) {
        for (key, value) in obj {
            if let Some(prop_schema) = properties.get(key) {
                if let Some(expected_type) = prop_schema.get("type").and_then(|v| v.as_str()) {
                    if !value_matches_type(value, expected_type) {
                        notes.push(format!(
                            "field '{}' expected type '{}', got {}",
                            key,
                            expected_type,
                            json_type_name(value)
                        ));
                    }
                }
            }
        }
    }

    notes
}

fn value_matches_type(value: &serde_json::Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
