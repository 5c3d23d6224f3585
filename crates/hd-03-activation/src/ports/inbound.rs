//! # Driving Ports (API - Inbound)
//!
//! Entry points used by the broker-facing surface.

use crate::domain::entities::{
    ActivationRequest, ActivationResponse, ChallengeRequest, ChallengeResponse,
};
use crate::errors::ActivationError;
use async_trait::async_trait;

/// Primary API of the activation coordinator.
#[async_trait]
pub trait ActivationApi: Send + Sync {
    /// Completes a join handshake.
    async fn activate(
        &self,
        request: ActivationRequest,
    ) -> Result<ActivationResponse, ActivationError>;

    /// Computes the MIC a join-request should carry for a device.
    async fn challenge(
        &self,
        request: ChallengeRequest,
    ) -> Result<ChallengeResponse, ActivationError>;
}
