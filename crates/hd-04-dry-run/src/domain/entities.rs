//! # Core Domain Entities
//!
//! Dry runs mirror production results but always return an object: a
//! failure fills `error` and keeps whatever logs were produced.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{LogEntry, PayloadFunctions};

/// Uplink test request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DryUplinkRequest {
    /// Raw payload to decode.
    pub payload: Vec<u8>,
    /// Functions under test.
    pub app: PayloadFunctions,
    /// Application port.
    pub port: u8,
}

/// Uplink test result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DryUplinkResult {
    /// Payload as given.
    pub payload: Vec<u8>,
    /// Decoded fields as a JSON object (empty on failure).
    pub fields: Value,
    /// Validator verdict; false on failure.
    pub valid: bool,
    /// Logs of every stage that ran.
    pub logs: Vec<LogEntry>,
    /// Failure description.
    pub error: Option<String>,
}

/// Downlink test request. Give either `payload` or `fields`, not both.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DryDownlinkRequest {
    /// Raw bytes to send as-is.
    #[serde(default)]
    pub payload: Vec<u8>,
    /// JSON object text to encode.
    #[serde(default)]
    pub fields: Option<String>,
    /// Functions under test.
    pub app: PayloadFunctions,
    /// Application port.
    pub port: u8,
}

/// Downlink test result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DryDownlinkResult {
    /// Bytes that would be sent (empty on failure).
    pub payload: Vec<u8>,
    /// Encoder logs.
    pub logs: Vec<LogEntry>,
    /// Failure description.
    pub error: Option<String>,
}

impl DryDownlinkResult {
    /// A failed run.
    #[must_use]
    pub fn failed(error: impl ToString, logs: Vec<LogEntry>) -> Self {
        Self {
            payload: Vec::new(),
            logs,
            error: Some(error.to_string()),
        }
    }
}

/// Counters kept by the dry-run engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DryRunStats {
    /// Uplink dry runs.
    pub uplinks: u64,
    /// Downlink dry runs.
    pub downlinks: u64,
    /// Runs that returned an error.
    pub errors: u64,
}
