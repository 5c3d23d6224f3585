//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Ports (Inbound)**: `DryRunApi`
//! - **Driven Ports (Outbound)**: `PayloadCodecApi` (from hd-02)

pub mod inbound;

pub use hd_02_payload_codec::ports::inbound::PayloadCodecApi;
pub use inbound::*;
