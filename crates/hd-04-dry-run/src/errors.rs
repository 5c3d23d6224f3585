//! # Error Types
//!
//! Request validation errors of the dry-run engine. Pipeline errors come
//! from `hd-02-payload-codec` and are reported through the result's
//! `error` field.

use thiserror::Error;

/// Invalid dry-run request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DryRunError {
    /// Both raw bytes and fields were given.
    #[error("provide either payload or fields, not both")]
    PayloadAndFields,

    /// Fields text is not valid JSON.
    #[error("fields are not valid JSON: {0}")]
    InvalidFields(String),

    /// Fields text is valid JSON but not an object.
    #[error("fields must be a JSON object, got {0}")]
    FieldsNotObject(String),
}
