//! # Error Types
//!
//! Errors shared by subsystems that talk to the external registry.

use thiserror::Error;

/// Errors returned by registry adapters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No record under the given key.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The registry did not answer within the configured ceiling.
    #[error("Registry timeout after {timeout_ms}ms")]
    Timeout {
        /// Ceiling that was exceeded.
        timeout_ms: u64,
    },

    /// The registry cannot be reached.
    #[error("Registry unavailable: {0}")]
    Unavailable(String),

    /// The stored record could not be decoded.
    #[error("Corrupt registry record: {0}")]
    Corrupt(String),
}

impl RegistryError {
    /// Returns true if the caller may retry the same request later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(RegistryError::Timeout { timeout_ms: 10 }.is_retryable());
        assert!(RegistryError::Unavailable("down".into()).is_retryable());
        assert!(!RegistryError::NotFound("app/dev".into()).is_retryable());
        assert!(!RegistryError::Corrupt("bad".into()).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = RegistryError::Timeout { timeout_ms: 250 };
        assert_eq!(err.to_string(), "Registry timeout after 250ms");
    }
}
