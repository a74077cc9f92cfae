//! Shared utility functions used across multiple modules.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Canonical string form of a recipe id, used as the join key between the
/// local and remote copies of a list.
pub fn normalize_id(value: &str) -> String {
    value.trim().to_string()
}

/// Id stored as a JSON string or number. Anything else yields an empty id.
pub fn json_id(value: &Value) -> String {
    match value {
        Value::String(id) => normalize_id(id),
        Value::Number(id) => id
            .as_i64()
            .map_or_else(|| id.to_string(), |id| id.to_string()),
        _ => String::new(),
    }
}

/// Serde adapter for ids written as either strings or numbers.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| json_id(&value))
}
