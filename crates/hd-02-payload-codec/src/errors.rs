//! # Error Types
//!
//! Pipeline errors. Stage errors wrap the sandbox failure together with
//! every log entry produced up to and including the failing stage.

use hd_01_script_sandbox::errors::{SandboxError, SandboxFailure};
use shared_types::{AppId, LogEntry, RegistryError};
use thiserror::Error;

/// Errors raised by the codec pipeline and service.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    /// The decoder failed.
    #[error("decode failed: {0}")]
    Decode(SandboxFailure),

    /// The converter failed.
    #[error("convert failed: {0}")]
    Convert(SandboxFailure),

    /// The validator failed (a `false` verdict is not an error).
    #[error("validate failed: {0}")]
    Validate(SandboxFailure),

    /// The encoder failed.
    #[error("encode failed: {0}")]
    Encode(SandboxFailure),

    /// Fields were given but the application defines no encoder.
    #[error("downlink has fields but the application defines no encoder")]
    MissingEncoder,

    /// The application is not registered.
    #[error("unknown application: {0}")]
    UnknownApplication(AppId),

    /// Registry lookup failed.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The blocking worker running the pipeline panicked or was cancelled.
    #[error("codec worker failed: {0}")]
    Worker(String),
}

impl CodecError {
    /// Log entries gathered before the failure.
    #[must_use]
    pub fn logs(&self) -> &[LogEntry] {
        match self.failure() {
            Some(failure) => &failure.logs,
            None => &[],
        }
    }

    /// Consumes the error, returning its logs.
    #[must_use]
    pub fn into_logs(self) -> Vec<LogEntry> {
        match self {
            Self::Decode(f) | Self::Convert(f) | Self::Validate(f) | Self::Encode(f) => f.logs,
            _ => Vec::new(),
        }
    }

    /// Underlying sandbox error of a stage failure.
    #[must_use]
    pub fn sandbox_error(&self) -> Option<&SandboxError> {
        self.failure().map(|f| &f.error)
    }

    /// Returns true if a stage hit the sandbox deadline.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.sandbox_error().is_some_and(SandboxError::is_timeout)
    }

    fn failure(&self) -> Option<&SandboxFailure> {
        match self {
            Self::Decode(f) | Self::Convert(f) | Self::Validate(f) | Self::Encode(f) => Some(f),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_exposes_logs() {
        let err = CodecError::Convert(SandboxFailure {
            error: SandboxError::Runtime("boom".into()),
            logs: vec![LogEntry::new("decoder", vec!["1".into()])],
        });
        assert_eq!(err.logs().len(), 1);
        assert_eq!(err.to_string(), "convert failed: runtime error: boom");
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_non_stage_errors_have_no_logs() {
        assert!(CodecError::MissingEncoder.logs().is_empty());
        let err: CodecError = RegistryError::Unavailable("down".into()).into();
        assert!(err.sandbox_error().is_none());
        assert!(err.into_logs().is_empty());
    }

    #[test]
    fn test_timeout_detection() {
        let err = CodecError::Decode(SandboxFailure::without_logs(SandboxError::Timeout {
            limit_ms: 100,
        }));
        assert!(err.is_timeout());
    }
}
