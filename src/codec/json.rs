//! Flat JSON objects of string values: `{"API_KEY": "abc", "TOKEN": "xyz"}`.

use serde_json::{Map, Value};

use crate::errors::{AkError, Result};

/// Parse a flat JSON object whose values are all strings.
///
/// Pairs come back in document order. Nested objects, arrays, numbers,
/// booleans and nulls are rejected with an error naming the key.
pub fn parse_json_min(text: &str) -> Result<Vec<(String, String)>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| AkError::ImportParse(format!("invalid JSON: {e}")))?;

    let Value::Object(map) = value else {
        return Err(AkError::ImportParse(
            "expected a JSON object of NAME: \"value\" pairs".into(),
        ));
    };

    map.into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key, s)),
            other => Err(AkError::ImportParse(format!(
                "value of '{key}' must be a string, found {}",
                kind(&other)
            ))),
        })
        .collect()
}

/// Render pairs as a pretty-printed JSON object, in the given order.
pub fn render_json<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<String> {
    let map: Map<String, Value> = pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    serde_json::to_string_pretty(&Value::Object(map))
        .map_err(|e| AkError::SerializationError(e.to_string()))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
