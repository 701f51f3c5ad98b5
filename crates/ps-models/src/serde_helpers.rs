//! Lenient field decoders for backend records
//!
//! The backend stores flags as 0/1 integers, booleans, or strings depending on
//! the endpoint; these helpers accept all of them.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decode a 0/1, `"0"`/`"1"`, boolean or null flag
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map_or(false, truthy))
}

/// Decode an optional flag, keeping `None` for a missing or null value
pub fn optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(v) => Some(truthy(&v)),
    })
}

/// Decode a string that may arrive as a number, or be null
pub fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().map_or(false, |n| n != 0),
        Value::String(s) => matches!(s.trim(), "1" | "true" | "Y" | "y"),
        _ => false,
    }
}
