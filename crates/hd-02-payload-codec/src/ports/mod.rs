//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Ports (Inbound)**: `PayloadCodecApi`
//! - **Driven Ports (Outbound)**: `DeviceRegistry` (application lookup)

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
