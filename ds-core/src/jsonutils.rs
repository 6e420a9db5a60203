//! Helpers for poking at schema fragments that arrive as untyped JSON.
use std::collections::HashSet;

use serde_json::Value;

/// Every object key that appears anywhere inside `value`, including keys nested in arrays.
pub fn recursive_keys(value: &Value) -> HashSet<&str> {
    let mut keys = HashSet::new();
    let mut to_visit = vec![value];
    while let Some(v) = to_visit.pop() {
        match v {
            Value::Object(map) => {
                for (k, child) in map {
                    keys.insert(k.as_str());
                    to_visit.push(child);
                }
            },
            Value::Array(items) => to_visit.extend(items),
            _ => (),
        }
    }
    keys
}

/// Case-insensitive search for `needle` in any key or string leaf of `value`.
pub fn contains_text(value: &Value, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    let mut to_visit = vec![value];
    while let Some(v) = to_visit.pop() {
        match v {
            Value::String(s) if s.to_lowercase().contains(&needle) => return true,
            Value::Object(map) => {
                if map.keys().any(|k| k.to_lowercase().contains(&needle)) {
                    return true;
                }
                to_visit.extend(map.values());
            },
            Value::Array(items) => to_visit.extend(items),
            _ => (),
        }
    }
    false
}

/// Name of the JSON type of `value`; integral numbers are reported separately from floats.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// True when the non-null members of `values` do not all share one JSON type.
///
/// `null` is tolerated alongside anything else since it stands in for "not provided".
pub fn is_mixed_type(values: &[Value]) -> bool {
    let mut types = values.iter().filter(|v| !v.is_null()).map(type_name);
    match types.next() {
        Some(first) => types.any(|t| t != first),
        None => false,
    }
}
