//! # HD-01 Script Sandbox - Bounded Payload Function Execution
//!
//! **Subsystem ID:** 1
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Runs application-supplied payload functions (`Decoder`, `Converter`,
//! `Validator`, `Encoder`) with a wall-clock deadline, resource ceilings and
//! no access to the host. Every run reports the log entries the function
//! emitted, whether it succeeded or not.
//!
//! ## Guarantees
//!
//! | Guarantee | Enforcement Location |
//! |-----------|---------------------|
//! | Bounded wall-clock time | `engine/interpreter.rs` - progress hook deadline |
//! | No host access | `no_module` + `no_time` features, `eval` disabled |
//! | Fresh state per run | `engine/interpreter.rs` - engine built per call |
//! | Logs survive failures | `errors.rs` - `SandboxFailure::logs` |
//! | Role output shapes | `domain/shape.rs` |
//!
//! ## Default Limits
//!
//! | Limit | Value |
//! |-------|-------|
//! | `timeout` | 100 ms |
//! | `max_string_size` | 64 KiB |
//! | `max_array_size` | 16384 |
//! | `max_map_size` | 4096 |
//! | `max_call_levels` | 32 |
//!
//! ## Usage Example
//!
//! ```ignore
//! use hd_01_script_sandbox::prelude::*;
//!
//! let sandbox = ScriptSandbox::default();
//! let src = "fn Decoder(bytes, port) { #{ temperature: bytes[0] } }";
//! let exec = sandbox.decode(src, &[0x1A], 1)?;
//! assert_eq!(exec.output["temperature"], 26);
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod domain;
pub mod engine;
pub mod errors;
pub mod ports;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::domain::entities::{Execution, FunctionRole, SandboxLimits};
    pub use crate::domain::shape::{bytes_to_value, describe};
    pub use crate::engine::{LogBuffer, ScriptSandbox};
    pub use crate::errors::{SandboxError, SandboxFailure};
    pub use crate::ports::inbound::ScriptRunner;
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 1;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Script Sandbox";

// =============================================================================
// TESTS
// =============================================================================
