//! # Value Conversion
//!
//! Moves values between JSON and the interpreter's `Dynamic`.
//!
//! | JSON | Script |
//! |------|--------|
//! | `null` | `()` |
//! | boolean | `bool` |
//! | integer (fits `i64`) | `INT` |
//! | other number | `FLOAT` |
//! | string | string |
//! | array | array |
//! | object | object map |
//!
//! Going back, blobs become arrays of byte values and characters become
//! one-character strings. Function pointers and custom types have no JSON
//! form and are rejected.

use crate::errors::SandboxError;
use rhai::{Array, Dynamic, Map, FLOAT, INT};
use serde_json::{Number, Value};

/// Converts a JSON value into a script value.
#[must_use]
pub fn json_to_dynamic(value: Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Dynamic::from(i as INT),
            None => Dynamic::from(n.as_f64().unwrap_or(FLOAT::NAN) as FLOAT),
        },
        Value::String(s) => Dynamic::from(s),
        Value::Array(items) => {
            let array: Array = items.into_iter().map(json_to_dynamic).collect();
            Dynamic::from(array)
        }
        Value::Object(entries) => {
            let mut map = Map::new();
            for (key, item) in entries {
                map.insert(key.into(), json_to_dynamic(item));
            }
            Dynamic::from(map)
        }
    }
}

/// Converts a script value into JSON.
pub fn dynamic_to_json(value: Dynamic) -> Result<Value, SandboxError> {
    let type_name = value.type_name().to_string();

    if value.is_unit() {
        return Ok(Value::Null);
    }
    if let Ok(b) = value.as_bool() {
        return Ok(Value::Bool(b));
    }
    if let Ok(i) = value.as_int() {
        return Ok(Value::from(i));
    }
    if let Ok(f) = value.as_float() {
        return Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| SandboxError::type_mismatch("finite number", f.to_string()));
    }
    if let Ok(c) = value.as_char() {
        return Ok(Value::String(c.to_string()));
    }
    if value.is_string() {
        return value
            .into_string()
            .map(Value::String)
            .map_err(|found| SandboxError::type_mismatch("string", found));
    }
    if value.is_blob() {
        return value
            .into_blob()
            .map(|blob| Value::Array(blob.into_iter().map(Value::from).collect()))
            .map_err(|found| SandboxError::type_mismatch("blob", found));
    }
    if value.is_array() {
        let items = value
            .into_array()
            .map_err(|found| SandboxError::type_mismatch("array", found))?;
        return items
            .into_iter()
            .map(dynamic_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array);
    }
    if value.is_map() {
        let map = value
            .try_cast::<Map>()
            .ok_or_else(|| SandboxError::type_mismatch("object map", type_name.clone()))?;
        let mut object = serde_json::Map::with_capacity(map.len());
        for (key, item) in map {
            object.insert(key.to_string(), dynamic_to_json(item)?);
        }
        return Ok(Value::Object(object));
    }

    Err(SandboxError::type_mismatch("JSON-compatible value", type_name))
}

/// JSON text of a logged value.
///
/// Values without a JSON form are logged as their display string so a log
/// call never fails the function that made it.
#[must_use]
pub fn log_field(value: Dynamic) -> String {
    let display = value.to_string();
    dynamic_to_json(value)
        .ok()
        .and_then(|json| serde_json::to_string(&json).ok())
        .unwrap_or_else(|| Value::String(display).to_string())
}
