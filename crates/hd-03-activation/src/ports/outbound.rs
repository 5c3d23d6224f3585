//! # Driven Ports (SPI - Outbound)
//!
//! | Port | Provided by | Used in phase |
//! |------|-------------|---------------|
//! | `DeviceRegistry` | `shared-types` | Resolving, Deriving (upsert) |
//! | `PayloadCodecApi` | `hd-02-payload-codec` | Encoding |

pub use hd_02_payload_codec::ports::inbound::PayloadCodecApi;
pub use shared_types::registry::{bounded, DeviceRegistry};
