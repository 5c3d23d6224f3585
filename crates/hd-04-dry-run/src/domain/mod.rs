//! # Domain Layer (Inner Hexagon)
//!
//! Dry-run requests and results.

pub mod entities;

pub use entities::*;
