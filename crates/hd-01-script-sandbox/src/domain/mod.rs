//! # Domain Layer (Inner Hexagon)
//!
//! Roles, limits and output contracts of payload functions.
//! NO I/O, NO async, NO interpreter types.

pub mod entities;
pub mod shape;

pub use entities::*;
