//! # Core Domain Entities
//!
//! Requests, responses and bookkeeping of the activation handshake.

use serde::{Deserialize, Serialize};
use shared_types::{AesKey, AppId, AppNonce, DevAddr, DevId, DeviceKind, LogEntry, NetId};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// PHASES
// =============================================================================

/// Steps of one activation, in order. Both success and failure are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationPhase {
    /// Request accepted for processing.
    Received,
    /// Device and application lookup.
    Resolving,
    /// Session material derivation and device update.
    Deriving,
    /// Optional activation downlink encoding.
    Encoding,
    /// Response assembly.
    Responding,
}

impl fmt::Display for ActivationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Resolving => "resolving",
            Self::Deriving => "deriving",
            Self::Encoding => "encoding",
            Self::Responding => "responding",
        };
        f.write_str(name)
    }
}

// =============================================================================
// METADATA
// =============================================================================

/// Network parameters chosen by the broker for a LoRaWAN join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LorawanActivationMetadata {
    /// Address assigned to the device.
    pub dev_addr: DevAddr,
    /// Network identifier.
    pub net_id: NetId,
    /// RX1 data rate offset (0..=7).
    pub rx1_dr_offset: u8,
    /// RX2 data rate index (0..=15).
    pub rx2_dr: u8,
    /// RX1 delay in seconds.
    pub rx_delay: u8,
    /// Optional channel frequency list.
    #[serde(default)]
    pub cf_list: Option<[u8; 16]>,
}

impl LorawanActivationMetadata {
    /// DLSettings byte of the join-accept.
    #[must_use]
    pub fn dl_settings(&self) -> u8 {
        ((self.rx1_dr_offset & 0x07) << 4) | (self.rx2_dr & 0x0F)
    }
}

/// Protocol-specific activation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivationMetadata {
    /// LoRaWAN join parameters.
    Lorawan(LorawanActivationMetadata),
}

impl ActivationMetadata {
    /// Protocol tag.
    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Lorawan(_) => DeviceKind::Lorawan,
        }
    }
}

/// A gateway transmit slot offered by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownlinkOption {
    /// Broker-assigned option identifier.
    pub identifier: String,
    /// Gateway that would transmit.
    pub gateway_id: String,
    /// Lower is better.
    pub score: u32,
}

// =============================================================================
// REQUESTS / RESPONSES
// =============================================================================

/// Deduplicated join forwarded by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRequest {
    /// Application of the joining device.
    pub app_id: AppId,
    /// Joining device.
    pub dev_id: DevId,
    /// Join-request PHYPayload.
    pub payload: Vec<u8>,
    /// Broker-chosen network parameters.
    pub metadata: ActivationMetadata,
    /// Transmit slots for the answer.
    pub downlink_options: Vec<DownlinkOption>,
}

impl ActivationRequest {
    /// Option with the lowest score.
    #[must_use]
    pub fn best_downlink_option(&self) -> Option<&DownlinkOption> {
        self.downlink_options.iter().min_by_key(|o| o.score)
    }
}

/// Protocol message carrying the join-accept and session material.
///
/// The only place session keys leave the handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationEnvelope {
    /// Encrypted join-accept PHYPayload.
    pub join_accept: Vec<u8>,
    /// Address assigned to the device.
    pub dev_addr: DevAddr,
    /// Handler nonce used for derivation.
    pub app_nonce: AppNonce,
    /// Network session key.
    pub nwk_s_key: AesKey,
    /// Application session key.
    pub app_s_key: AesKey,
}

/// Answer to a successful activation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationResponse {
    /// Unique id of this activation.
    pub activation_id: Uuid,
    /// Encoded activation downlink; empty when none is configured or
    /// encoding failed.
    pub payload: Vec<u8>,
    /// Port of the activation downlink, if any.
    pub port: Option<u8>,
    /// Join-accept and session material.
    pub envelope: ActivationEnvelope,
    /// Selected transmit slot.
    pub downlink_option: DownlinkOption,
    /// Parameters the join was accepted with.
    pub metadata: ActivationMetadata,
    /// Encoder logs and diagnostics.
    pub logs: Vec<LogEntry>,
    /// True if the activation downlink could not be encoded.
    pub degraded: bool,
}

/// MIC check requested before activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRequest {
    /// Application of the device.
    pub app_id: AppId,
    /// Device to check against.
    pub dev_id: DevId,
    /// Join-request PHYPayload.
    pub payload: Vec<u8>,
}

/// Result of a MIC check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    /// MIC computed with the device's key.
    pub expected_mic: [u8; 4],
    /// MIC carried by the frame.
    pub frame_mic: [u8; 4],
    /// True if both agree.
    pub matches: bool,
}

// =============================================================================
// STATISTICS
// =============================================================================

/// Counters kept by the coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationStats {
    /// Activation requests received.
    pub attempts: u64,
    /// Activations that produced a response.
    pub successes: u64,
    /// Activations that failed.
    pub failures: u64,
    /// Successes whose activation downlink could not be encoded.
    pub degraded: u64,
    /// Failures worth retrying.
    pub retryable_failures: u64,
}
