//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Ports (Inbound)**: `ScriptRunner`
//! - No outbound ports: a run never performs I/O.

pub mod inbound;

pub use inbound::*;
