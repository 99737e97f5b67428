//! Template data assembly

use crate::{HandlebarsError, Result};
use serde_json::{Map, Value};

/// Merge data maps left to right; a key in a later map replaces the same
/// key from an earlier one. `null` entries are skipped so callers can pass
/// optional data.
pub fn merge_data(maps: &[Value]) -> Result<Map<String, Value>> {
    let mut merged = Map::new();
    for map in maps {
        match map {
            Value::Object(entries) => {
                merged.extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Value::Null => {}
            other => return Err(HandlebarsError::InvalidData(kind(other).to_string())),
        }
    }
    Ok(merged)
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
