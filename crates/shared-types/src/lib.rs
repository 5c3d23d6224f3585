//! # Shared Types Crate
//!
//! Records, value objects and collaborators shared by every handler
//! subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-subsystem types live here only.
//! - **Registry Ownership**: application and device records belong to the
//!   external registry; subsystems hold them by value for one request.
//! - **Redacted Secrets**: key material never prints through `Debug`.

pub mod entities;
pub mod errors;
pub mod lorawan;
pub mod quota;
pub mod registry;

pub use entities::*;
pub use errors::*;
pub use lorawan::*;
pub use quota::CallQuota;
pub use registry::{bounded, DeviceRegistry, InMemoryRegistry};
