//! # Core Domain Entities
//!
//! Results of the uplink and downlink pipelines.

use serde::{Deserialize, Serialize};
use shared_types::{AppId, DevId, Fields, LogEntry};

/// Result of the uplink pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UplinkOutput {
    /// Payload as received.
    pub payload: Vec<u8>,
    /// Decoded (and converted) fields. Empty without a decoder.
    pub fields: Fields,
    /// False only if a validator rejected the fields.
    pub valid: bool,
    /// Logs of every stage, in execution order.
    pub logs: Vec<LogEntry>,
}

impl UplinkOutput {
    /// Payload passed through untouched.
    #[must_use]
    pub fn passthrough(payload: Vec<u8>) -> Self {
        Self {
            payload,
            fields: Fields::new(),
            valid: true,
            logs: Vec::new(),
        }
    }
}

/// Result of the downlink pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownlinkOutput {
    /// Bytes to send.
    pub payload: Vec<u8>,
    /// Encoder logs.
    pub logs: Vec<LogEntry>,
}

/// Uplink ready for delivery to the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedUplink {
    /// Owning application.
    pub app_id: AppId,
    /// Sending device.
    pub dev_id: DevId,
    /// Application port.
    pub port: u8,
    /// Raw payload.
    pub payload: Vec<u8>,
    /// Decoded fields.
    pub fields: Fields,
    /// Validator verdict.
    pub valid: bool,
}

/// Downlink ready for the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedDownlink {
    /// Owning application.
    pub app_id: AppId,
    /// Target device.
    pub dev_id: DevId,
    /// Application port.
    pub port: u8,
    /// Encoded bytes.
    pub payload: Vec<u8>,
}

/// Counters kept by the codec service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecStats {
    /// Uplink pipeline runs.
    pub uplinks: u64,
    /// Downlink pipeline runs.
    pub downlinks: u64,
    /// Runs that ended in an error.
    pub failures: u64,
    /// Failures caused by the sandbox deadline.
    pub timeouts: u64,
    /// Uplinks a validator rejected.
    pub invalid: u64,
}
