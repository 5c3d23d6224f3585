//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Ports (Inbound)**: `ActivationApi`
//! - **Driven Ports (Outbound)**: `DeviceRegistry`, `PayloadCodecApi`

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
