//! Structural checks on JSON values

use serde_json::Value;

/// Returns `true` only for bare structural records (JSON objects).
///
/// Arrays, strings, numbers, booleans and `null` are all rejected. This is the
/// gate every dispatched action has to pass.
pub fn is_plain_object(value: &Value) -> bool {
    matches!(value, Value::Object(_))
}

/// Short name of a value's kind, used in diagnostics.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
