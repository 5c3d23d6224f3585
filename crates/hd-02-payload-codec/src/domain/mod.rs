//! # Domain Layer (Inner Hexagon)
//!
//! Stage descriptors and pipeline results.
//! NO I/O, NO async.

pub mod entities;
pub mod stages;

pub use entities::*;
pub use stages::*;
