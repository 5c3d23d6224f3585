//! # Error Types
//!
//! Errors of the handler facade. Subsystem errors pass through unchanged.

use hd_02_payload_codec::prelude::CodecError;
use hd_03_activation::prelude::ActivationError;
use shared_types::RegistryError;
use thiserror::Error;

/// Errors returned by [`crate::HandlerService`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HandlerError {
    /// Activation was rejected or failed.
    #[error(transparent)]
    Activation(#[from] ActivationError),

    /// A production uplink or downlink failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The testing quota is spent for the current window.
    #[error("call quota of {limit} exceeded; resets in {resets_in_ms} ms")]
    QuotaExceeded {
        /// Calls allowed per window.
        limit: u64,
        /// Time until the window resets.
        resets_in_ms: u64,
    },
}

impl HandlerError {
    /// Returns true if the same call may succeed later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Activation(err) => err.is_retryable(),
            Self::Codec(CodecError::Registry(err)) => err.is_retryable(),
            Self::Codec(_) => false,
            Self::QuotaExceeded { .. } => true,
        }
    }

    /// Registry failure behind this error, if any.
    #[must_use]
    pub fn registry_error(&self) -> Option<&RegistryError> {
        match self {
            Self::Activation(
                ActivationError::Registry(err) | ActivationError::RegistryUnavailable(err),
            )
            | Self::Codec(CodecError::Registry(err)) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        let quota = HandlerError::QuotaExceeded {
            limit: 1,
            resets_in_ms: 10,
        };
        assert!(quota.is_retryable());

        let outage = HandlerError::from(CodecError::Registry(RegistryError::Unavailable(
            "down".into(),
        )));
        assert!(outage.is_retryable());
        assert!(outage.registry_error().is_some());

        let missing = HandlerError::from(CodecError::MissingEncoder);
        assert!(!missing.is_retryable());
        assert!(missing.registry_error().is_none());
    }

    #[test]
    fn test_display() {
        let err = HandlerError::QuotaExceeded {
            limit: 600,
            resets_in_ms: 1500,
        };
        assert_eq!(
            err.to_string(),
            "call quota of 600 exceeded; resets in 1500 ms"
        );
    }
}
