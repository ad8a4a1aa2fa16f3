//! Reply content post-processing: JSON extraction.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

fn json_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?is)<json>(.*?)</json>").expect("valid regex"))
}

/// Extract a JSON value from reply content.
///
/// A `<json>...</json>` block wins when present and must itself parse.
/// Otherwise the whole content is parsed, after stripping a Markdown code
/// fence if the model added one. `None` means blank or unparseable, which
/// JSON mode treats as retryable.
pub(crate) fn extract_json(content: &str) -> Option<Value> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(captures) = json_tag_pattern().captures(trimmed) {
        let inner = captures.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        return serde_json::from_str(inner).ok();
    }
    serde_json::from_str(&strip_code_fences(trimmed)).ok()
}

fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        let without_opening = if let Some(rest) = trimmed.strip_prefix("```json") {
            rest
        } else if let Some(rest) = trimmed.strip_prefix("```") {
            rest
        } else {
            trimmed
        };
        if let Some(stripped) = without_opening.strip_suffix("```") {
            return stripped.trim().to_string();
        }
        return without_opening.trim().to_string();
    }
    trimmed.to_string()
}
