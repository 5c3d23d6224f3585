//! # Driving Ports (API - Inbound)
//!
//! Async entry points of the codec. Pipelines run on the blocking pool; a
//! caller that goes away does not stop a run already started, which ends on
//! its own or at the sandbox deadline.

use crate::domain::entities::{DownlinkOutput, ProcessedDownlink, ProcessedUplink, UplinkOutput};
use crate::errors::CodecError;
use crate::ports::outbound::DeviceRegistry;
use async_trait::async_trait;
use shared_types::{DownlinkMessage, DownlinkPayload, PayloadFunctions, UplinkMessage};

/// Primary API of the payload codec.
#[async_trait]
pub trait PayloadCodecApi: Send + Sync {
    /// Runs the uplink pipeline with the given functions.
    async fn decode_uplink(
        &self,
        functions: PayloadFunctions,
        payload: Vec<u8>,
        port: u8,
    ) -> Result<UplinkOutput, CodecError>;

    /// Runs the downlink pipeline with the given functions.
    async fn encode_downlink(
        &self,
        functions: PayloadFunctions,
        payload: DownlinkPayload,
        port: u8,
    ) -> Result<DownlinkOutput, CodecError>;

    /// Resolves the application and decodes a device uplink for delivery.
    async fn process_uplink(
        &self,
        registry: &dyn DeviceRegistry,
        message: UplinkMessage,
    ) -> Result<ProcessedUplink, CodecError>;

    /// Resolves the application and encodes an application downlink.
    async fn process_downlink(
        &self,
        registry: &dyn DeviceRegistry,
        message: DownlinkMessage,
    ) -> Result<ProcessedDownlink, CodecError>;
}
