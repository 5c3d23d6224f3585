//! # LoRaWAN Handler Runtime
//!
//! Configuration, telemetry and wiring of the handler subsystems.
//!
//! ## Subsystems
//!
//! | ID | Crate | Role |
//! |----|-------|------|
//! | 1 | `hd-01-script-sandbox` | Runs untrusted payload functions |
//! | 2 | `hd-02-payload-codec` | Decoder/converter/validator/encoder pipelines |
//! | 3 | `hd-03-activation` | OTAA join handshake |
//! | 4 | `hd-04-dry-run` | Testing surface for payload functions |
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `HANDLER_*` variables and validate it
//! 2. Initialize tracing
//! 3. Connect the device registry
//! 4. Build [`HandlerService`]
//! 5. Serve until Ctrl+C

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod errors;
pub mod service;
pub mod status;
pub mod telemetry;

pub use config::{ConfigError, HandlerConfig};
pub use errors::HandlerError;
pub use service::HandlerService;
pub use status::{HandlerStatus, RateCounter, Rates};
pub use telemetry::{init_tracing, TelemetryConfig};

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::config::{ConfigError, HandlerConfig};
    pub use crate::errors::HandlerError;
    pub use crate::service::HandlerService;
    pub use crate::status::{ComponentStats, HandlerStatus, Rates, SystemStats};
    pub use crate::telemetry::{init_tracing, TelemetryConfig};
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
