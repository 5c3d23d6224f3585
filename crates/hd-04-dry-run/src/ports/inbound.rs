//! # Driving Ports (API - Inbound)

use crate::domain::entities::{
    DryDownlinkRequest, DryDownlinkResult, DryUplinkRequest, DryUplinkResult,
};
use async_trait::async_trait;

/// Testing surface for payload functions. Never fails: problems are
/// reported in the result's `error` field.
#[async_trait]
pub trait DryRunApi: Send + Sync {
    /// Runs the uplink pipeline on a caller-supplied payload.
    async fn dry_uplink(&self, request: DryUplinkRequest) -> DryUplinkResult;

    /// Runs the downlink pipeline on caller-supplied bytes or fields.
    async fn dry_downlink(&self, request: DryDownlinkRequest) -> DryDownlinkResult;
}
