//! # Core Domain Entities
//!
//! Roles, limits and results of a sandboxed function run.

use shared_types::LogEntry;
use std::fmt;
use std::time::Duration;

// =============================================================================
// FUNCTION ROLE
// =============================================================================

/// The four payload functions an application may define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionRole {
    /// Raw bytes to fields.
    Decoder,
    /// Fields to fields.
    Converter,
    /// Fields to a boolean verdict.
    Validator,
    /// Fields to raw bytes.
    Encoder,
}

impl FunctionRole {
    /// Name of the script function implementing the role.
    #[must_use]
    pub const fn function_name(self) -> &'static str {
        match self {
            Self::Decoder => "Decoder",
            Self::Converter => "Converter",
            Self::Validator => "Validator",
            Self::Encoder => "Encoder",
        }
    }

    /// Label attached to log entries produced by the role.
    #[must_use]
    pub const fn log_label(self) -> &'static str {
        match self {
            Self::Decoder => "decoder",
            Self::Converter => "converter",
            Self::Validator => "validator",
            Self::Encoder => "encoder",
        }
    }

    /// Every role takes `(input, port)`.
    #[must_use]
    pub const fn arity(self) -> usize {
        2
    }
}

impl fmt::Display for FunctionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.log_label())
    }
}

// =============================================================================
// LIMITS
// =============================================================================

/// Resource ceilings applied to every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxLimits {
    /// Wall-clock budget per run.
    pub timeout: Duration,
    /// Maximum interpreter operations per run. `0` disables the check.
    pub max_operations: u64,
    /// Maximum string length in bytes.
    pub max_string_size: usize,
    /// Maximum array (and blob) length.
    pub max_array_size: usize,
    /// Maximum object map entries.
    pub max_map_size: usize,
    /// Maximum nested function call depth.
    pub max_call_levels: usize,
    /// Maximum expression nesting at global level.
    pub max_expr_depth: usize,
    /// Maximum expression nesting inside functions.
    pub max_function_expr_depth: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(100),
            max_operations: 0,
            max_string_size: 64 * 1024,
            max_array_size: 16_384,
            max_map_size: 4_096,
            max_call_levels: 32,
            max_expr_depth: 64,
            max_function_expr_depth: 32,
        }
    }
}

impl SandboxLimits {
    /// Timeout in whole milliseconds.
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Same limits with a different timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// EXECUTION
// =============================================================================

/// A successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution<T> {
    /// Value returned by the function.
    pub output: T,
    /// Log entries in emission order.
    pub logs: Vec<LogEntry>,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

impl<T> Execution<T> {
    /// Replaces the output, keeping logs and timing.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Execution<U> {
        Execution {
            output: f(self.output),
            logs: self.logs,
            elapsed: self.elapsed,
        }
    }
}
