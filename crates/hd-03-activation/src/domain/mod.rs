//! # Domain Layer (Inner Hexagon)
//!
//! Handshake entities, LoRaWAN join cryptography and the per-protocol
//! derivation strategies.
//! NO I/O, NO async.

pub mod crypto;
pub mod entities;
pub mod strategy;

pub use entities::*;
pub use strategy::{Derivation, LorawanOtaa, NonceSource, RandomNonces, SessionStrategy, StrategyTable};
