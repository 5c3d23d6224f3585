//! # Driven Ports (SPI - Outbound)
//!
//! Production processing resolves applications through the shared registry
//! port. Only `get_application` is used here.

pub use shared_types::registry::{bounded, DeviceRegistry};
