/// Completion response parsing
///
/// Models wrap their answers unpredictably: a ```json fence, a single
/// backtick pair, or nothing at all. This strips the wrapping, parses the
/// remainder as JSON and insists on an array of strings. The returned
/// order is the model's own ranking and must be preserved downstream.
use crate::error::{AppError, AppResult};

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Extracts an ordered list of title strings from a raw completion.
pub fn parse_title_array(raw: &str) -> AppResult<Vec<String>> {
    let trimmed = raw.trim();

    let body = if let Some(inner) = trimmed.strip_prefix(JSON_FENCE) {
        inner.strip_suffix(FENCE).unwrap_or(inner).trim()
    } else if let Some(inner) = trimmed.strip_prefix('`') {
        inner.strip_suffix('`').unwrap_or(inner).trim()
    } else {
        trimmed
    };

    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| AppError::ParseFailure(format!("Completion is not valid JSON: {}", e)))?;

    let entries = value.as_array().ok_or_else(|| {
        AppError::ParseFailure("Completion is not a JSON array".to_string())
    })?;

    entries
        .iter()
        .map(|entry| {
            entry.as_str().map(String::from).ok_or_else(|| {
                AppError::ParseFailure(format!("Array element is not a string: {}", entry))
            })
        })
        .collect()
}
