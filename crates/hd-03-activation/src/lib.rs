//! # HD-03 Activation - OTAA Join Coordinator
//!
//! **Subsystem ID:** 3
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Completes device activation handshakes forwarded by the broker: looks
//! up the device and its application, derives fresh session material,
//! stores it, optionally encodes an activation downlink, and answers with
//! the join-accept envelope.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Join MIC verified with the AppKey | `domain/strategy.rs` - `LorawanOtaa::derive()` |
//! | DevNonce never reused per device | `domain/strategy.rs` - `LorawanOtaa::derive()` |
//! | Device stored before Encoding | `service.rs` - `run()` |
//! | Encoding failures never fail activation | `service.rs` - `encode_activation_downlink()` |
//! | Session keys only in the envelope | `domain/entities.rs` - `ActivationEnvelope`, redacted `AesKey` |
//! | Registry calls bounded | `service.rs` - `bounded()` wrapper |
//!
//! ## Outbound Dependencies
//!
//! | Collaborator | Trait | Purpose |
//! |--------------|-------|---------|
//! | Registry | `DeviceRegistry` | Device/application lookup, device upsert |
//! | HD-02 | `PayloadCodecApi` | Encode the activation downlink |
//!
//! ## Usage Example
//!
//! ```ignore
//! use hd_03_activation::prelude::*;
//!
//! let coordinator = ActivationCoordinator::new(registry, codec, ActivationConfig::default());
//! let response = coordinator.activate(request).await?;
//! send(response.envelope.join_accept, response.downlink_option);
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
pub mod errors;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::domain::crypto::{JoinAccept, JoinRequest, SessionKeys};
    pub use crate::domain::entities::{
        ActivationEnvelope, ActivationMetadata, ActivationPhase, ActivationRequest,
        ActivationResponse, ActivationStats, ChallengeRequest, ChallengeResponse, DownlinkOption,
        LorawanActivationMetadata,
    };
    pub use crate::domain::strategy::{
        LorawanOtaa, NonceSource, RandomNonces, SessionStrategy, StrategyTable,
    };
    pub use crate::errors::ActivationError;
    pub use crate::ports::inbound::ActivationApi;
    pub use crate::service::{ActivationConfig, ActivationCoordinator};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 3;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Activation";
