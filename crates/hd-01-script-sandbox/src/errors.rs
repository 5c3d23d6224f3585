//! # Error Types
//!
//! All error types for payload function execution.

use shared_types::LogEntry;
use thiserror::Error;

// =============================================================================
// SANDBOX ERRORS
// =============================================================================

/// Errors that can occur while running a payload function.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SandboxError {
    /// Source does not parse, or does not define the requested function.
    #[error("compile error: {0}")]
    Compile(String),

    /// Wall-clock budget exhausted.
    #[error("execution timeout: exceeded {limit_ms}ms")]
    Timeout {
        /// Budget that was exceeded.
        limit_ms: u64,
    },

    /// The function threw, or the interpreter rejected an operation.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// The function returned a value of the wrong shape for its role.
    #[error("type error: expected {expected}, found {found}")]
    Type {
        /// Shape the role requires.
        expected: String,
        /// Shape actually returned.
        found: String,
    },

    /// A size, depth or operation limit was hit.
    #[error("resource limit exceeded: {0}")]
    ResourceLimit(String),
}

impl SandboxError {
    /// Returns true if the source never started executing.
    #[must_use]
    pub fn is_compile_error(&self) -> bool {
        matches!(self, Self::Compile(_))
    }

    /// Returns true if execution was cancelled by the deadline.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub(crate) fn type_mismatch(expected: &str, found: impl Into<String>) -> Self {
        Self::Type {
            expected: expected.to_string(),
            found: found.into(),
        }
    }
}

// =============================================================================
// SANDBOX FAILURE
// =============================================================================

/// A failed run together with the log entries emitted before it failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{error}")]
pub struct SandboxFailure {
    /// What went wrong.
    #[source]
    pub error: SandboxError,
    /// Log entries in emission order.
    pub logs: Vec<LogEntry>,
}

impl SandboxFailure {
    /// A failure with no log output (compile errors).
    #[must_use]
    pub fn without_logs(error: SandboxError) -> Self {
        Self {
            error,
            logs: Vec::new(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandbox_error_display() {
        let err = SandboxError::Timeout { limit_ms: 100 };
        assert_eq!(err.to_string(), "execution timeout: exceeded 100ms");

        let err = SandboxError::type_mismatch("object", "integer");
        assert_eq!(err.to_string(), "type error: expected object, found integer");
    }

    #[test]
    fn test_classification() {
        assert!(SandboxError::Compile("x".into()).is_compile_error());
        assert!(!SandboxError::Runtime("x".into()).is_compile_error());
        assert!(SandboxError::Timeout { limit_ms: 1 }.is_timeout());
    }

    #[test]
    fn test_failure_displays_inner_error() {
        let failure = SandboxFailure::without_logs(SandboxError::Runtime("boom".into()));
        assert_eq!(failure.to_string(), "runtime error: boom");
        assert!(failure.logs.is_empty());
    }
}
