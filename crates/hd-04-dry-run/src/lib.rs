//! # HD-04 Dry Run - Payload Function Test Harness
//!
//! **Subsystem ID:** 4
//!
//! Runs the uplink or downlink pipeline against functions and payloads
//! supplied by the caller, without touching the registry. Results have the
//! production shape plus an `error` field; a dry run never fails outright.
//!
//! | Operation | Input | Result |
//! |-----------|-------|--------|
//! | `dry_uplink` | payload, functions, port | payload, fields, valid, logs, error |
//! | `dry_downlink` | payload or fields text, functions, port | payload, logs, error |

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::domain::entities::{
        DryDownlinkRequest, DryDownlinkResult, DryRunStats, DryUplinkRequest, DryUplinkResult,
    };
    pub use crate::errors::DryRunError;
    pub use crate::ports::inbound::DryRunApi;
    pub use crate::service::{downlink_body, DryRunEngine};
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 4;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Dry Run";
