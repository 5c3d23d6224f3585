//! # Output Shapes
//!
//! Checks that a function returned what its role promises:
//!
//! | Role | Shape |
//! |------|-------|
//! | Decoder, Converter | JSON object |
//! | Validator | boolean |
//! | Encoder | array of integers in `0..=255` |

use crate::errors::SandboxError;
use serde_json::Value;
use shared_types::Fields;

/// Short description of a JSON value for error messages.
#[must_use]
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(n) if n.is_f64() => "float".to_string(),
        Value::Number(_) => "integer".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

/// Decoder and converter output.
pub fn expect_fields(value: Value) -> Result<Fields, SandboxError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(SandboxError::type_mismatch("object", describe(&other))),
    }
}

/// Validator output.
pub fn expect_verdict(value: Value) -> Result<bool, SandboxError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(SandboxError::type_mismatch("boolean", describe(&other))),
    }
}

/// Encoder output.
pub fn expect_bytes(value: Value) -> Result<Vec<u8>, SandboxError> {
    const EXPECTED: &str = "array of bytes (0-255)";

    let Value::Array(items) = value else {
        return Err(SandboxError::type_mismatch(EXPECTED, describe(&value)));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .ok_or_else(|| {
                    SandboxError::type_mismatch(
                        EXPECTED,
                        format!("{item} ({}) at index {index}", describe(&item)),
                    )
                })
        })
        .collect()
}

/// Bytes as the JSON array handed to `Decoder`.
#[must_use]
pub fn bytes_to_value(bytes: &[u8]) -> Value {
    Value::Array(bytes.iter().map(|b| Value::from(*b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expect_fields() {
        let fields = expect_fields(json!({"temperature": 26})).unwrap();
        assert_eq!(fields["temperature"], 26);

        let err = expect_fields(json!([1, 2])).unwrap_err();
        assert_eq!(
            err,
            SandboxError::Type {
                expected: "object".into(),
                found: "array".into()
            }
        );
    }

    #[test]
    fn test_expect_verdict() {
        assert!(expect_verdict(json!(true)).unwrap());
        assert!(!expect_verdict(json!(false)).unwrap());
        assert!(expect_verdict(json!(1)).is_err());
    }

    #[test]
    fn test_expect_bytes() {
        assert_eq!(expect_bytes(json!([0, 1, 255])).unwrap(), vec![0, 1, 255]);
        assert!(expect_bytes(json!([256])).is_err());
        assert!(expect_bytes(json!([-1])).is_err());
        assert!(expect_bytes(json!([1.5])).is_err());
        assert!(expect_bytes(json!("AQI=")).is_err());
        assert_eq!(expect_bytes(json!([])).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_bytes_error_points_at_offender() {
        let err = expect_bytes(json!([1, 2, 300])).unwrap_err();
        assert!(err.to_string().contains("index 2"));
    }

    #[test]
    fn test_bytes_to_value() {
        assert_eq!(bytes_to_value(&[0x1A, 0xFF]), json!([26, 255]));
    }
}
