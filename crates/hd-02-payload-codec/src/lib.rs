//! # HD-02 Payload Codec - Uplink and Downlink Pipelines
//!
//! **Subsystem ID:** 2
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Turns raw radio payloads into application fields and back by running the
//! application's payload functions through the script sandbox.
//!
//! ## Pipelines
//!
//! | Direction | Stages | Result |
//! |-----------|--------|--------|
//! | Uplink | Decode → Convert → Validate | fields, valid flag, logs |
//! | Downlink | Encode | bytes, logs |
//!
//! ## Rules
//!
//! | Rule | Enforcement Location |
//! |------|---------------------|
//! | Absent stages pass through | `pipeline.rs` - stage loop |
//! | No decoder skips convert and validate | `pipeline.rs` - `uplink()` |
//! | Validator `false` is an outcome | `pipeline.rs` - `uplink()` |
//! | Raw downlink bytes pass through | `pipeline.rs` - `downlink()` |
//! | Logs kept in execution order on failure | `pipeline.rs` - `collect()` |
//! | Runs off the async reactor | `service.rs` - `spawn_blocking` |
//!
//! ## Outbound Dependencies
//!
//! | Collaborator | Trait | Purpose |
//! |--------------|-------|---------|
//! | Registry | `DeviceRegistry` | Resolve applications for production traffic |
//! | HD-01 | `ScriptRunner` | Execute payload functions |

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod domain;
pub mod errors;
pub mod pipeline;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::domain::entities::{
        CodecStats, DownlinkOutput, ProcessedDownlink, ProcessedUplink, UplinkOutput,
    };
    pub use crate::domain::stages::{Stage, StageKind};
    pub use crate::errors::CodecError;
    pub use crate::pipeline::PayloadCodecPipeline;
    pub use crate::ports::inbound::PayloadCodecApi;
    pub use crate::service::{CodecConfig, PayloadCodecService};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 2;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Payload Codec";
