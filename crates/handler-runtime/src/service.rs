//! # Handler Service
//!
//! Facade over the subsystems: the activation and testing groups, the
//! production uplink/downlink path and `GetStatus`.
//!
//! ## Wiring
//!
//! ```text
//!             ┌──────────────────── HandlerService ───────────────────┐
//! activate ──→│ ActivationCoordinator ──→ DeviceRegistry              │
//!             │          │                                            │
//!             │          ↓                                            │
//! uplink   ──→│ PayloadCodecService ──→ ScriptSandbox (blocking pool) │
//!             │          ↑                                            │
//! dry run  ──→│ CallQuota ──→ DryRunEngine ──→ PayloadCodecService    │
//!             └───────────────────────────────────────────────────────┘
//! ```

use crate::config::HandlerConfig;
use crate::errors::HandlerError;
use crate::status::{ComponentStats, HandlerStatus, RateCounter, SystemStats};
use hd_02_payload_codec::prelude::{
    PayloadCodecApi, PayloadCodecService, ProcessedDownlink, ProcessedUplink,
};
use hd_03_activation::prelude::{
    ActivationApi, ActivationCoordinator, ActivationRequest, ActivationResponse,
    ChallengeRequest, ChallengeResponse,
};
use hd_04_dry_run::prelude::{
    DryDownlinkRequest, DryDownlinkResult, DryRunApi, DryRunEngine, DryUplinkRequest,
    DryUplinkResult,
};
use shared_types::{CallQuota, DeviceRegistry, DownlinkMessage, UplinkMessage};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// The handler core.
pub struct HandlerService {
    registry: Arc<dyn DeviceRegistry>,
    codec: Arc<PayloadCodecService>,
    activation: ActivationCoordinator,
    dry_run: DryRunEngine,
    quota: CallQuota,
    uplinks: RateCounter,
    downlinks: RateCounter,
    activations: RateCounter,
    started: Instant,
}

impl HandlerService {
    /// Wire the subsystems around `registry`.
    pub fn new(config: &HandlerConfig, registry: Arc<dyn DeviceRegistry>) -> Self {
        let codec = Arc::new(PayloadCodecService::new(config.codec()));
        let activation = ActivationCoordinator::new(
            Arc::clone(&registry),
            Arc::clone(&codec) as Arc<dyn PayloadCodecApi>,
            config.activation(),
        );
        // Dry runs get their own codec so they stay out of production stats.
        let dry_run = DryRunEngine::new(Arc::new(PayloadCodecService::new(config.codec())));

        info!(
            script_timeout_ms = config.sandbox_limits().timeout_ms(),
            quota_limit = config.quota.limit,
            "handler service created"
        );

        Self {
            registry,
            codec,
            activation,
            dry_run,
            quota: config.call_quota(),
            uplinks: RateCounter::new(),
            downlinks: RateCounter::new(),
            activations: RateCounter::new(),
            started: Instant::now(),
        }
    }

    /// The registry the service reads from.
    #[must_use]
    pub fn registry(&self) -> &Arc<dyn DeviceRegistry> {
        &self.registry
    }

    // =========================================================================
    // ACTIVATION
    // =========================================================================

    /// Complete a join handshake.
    ///
    /// # Errors
    ///
    /// Any [`hd_03_activation::prelude::ActivationError`].
    pub async fn activate(
        &self,
        request: ActivationRequest,
    ) -> Result<ActivationResponse, HandlerError> {
        self.activations.record();
        Ok(self.activation.activate(request).await?)
    }

    /// Compute the MIC a device's join-request should carry.
    ///
    /// # Errors
    ///
    /// Unknown device, unsupported kind or registry failure.
    pub async fn challenge(
        &self,
        request: ChallengeRequest,
    ) -> Result<ChallengeResponse, HandlerError> {
        Ok(self.activation.challenge(request).await?)
    }

    // =========================================================================
    // TESTING (quota-gated)
    // =========================================================================

    /// Run the uplink pipeline on caller-supplied functions.
    ///
    /// # Errors
    ///
    /// [`HandlerError::QuotaExceeded`] only; pipeline failures are in the
    /// result.
    #[instrument(skip_all)]
    pub async fn dry_uplink(&self, request: DryUplinkRequest) -> Result<DryUplinkResult, HandlerError> {
        self.acquire()?;
        Ok(self.dry_run.dry_uplink(request).await)
    }

    /// Run the downlink pipeline on caller-supplied functions.
    ///
    /// # Errors
    ///
    /// [`HandlerError::QuotaExceeded`] only; pipeline failures are in the
    /// result.
    #[instrument(skip_all)]
    pub async fn dry_downlink(
        &self,
        request: DryDownlinkRequest,
    ) -> Result<DryDownlinkResult, HandlerError> {
        self.acquire()?;
        Ok(self.dry_run.dry_downlink(request).await)
    }

    fn acquire(&self) -> Result<(), HandlerError> {
        if self.quota.try_acquire() {
            return Ok(());
        }
        let resets_in_ms = u64::try_from(self.quota.resets_in().as_millis()).unwrap_or(u64::MAX);
        warn!(limit = self.quota.limit(), resets_in_ms, "call quota exceeded");
        Err(HandlerError::QuotaExceeded {
            limit: self.quota.limit(),
            resets_in_ms,
        })
    }

    // =========================================================================
    // TRAFFIC
    // =========================================================================

    /// Decode a device uplink with its application's functions.
    ///
    /// # Errors
    ///
    /// Unknown application, registry failure or a failing stage; the
    /// message is dropped.
    pub async fn process_uplink(
        &self,
        message: UplinkMessage,
    ) -> Result<ProcessedUplink, HandlerError> {
        self.uplinks.record();
        Ok(self
            .codec
            .process_uplink(self.registry.as_ref(), message)
            .await?)
    }

    /// Encode an application downlink.
    ///
    /// # Errors
    ///
    /// Unknown application, registry failure, missing encoder or a failing
    /// encoder.
    pub async fn process_downlink(
        &self,
        message: DownlinkMessage,
    ) -> Result<ProcessedDownlink, HandlerError> {
        self.downlinks.record();
        Ok(self
            .codec
            .process_downlink(self.registry.as_ref(), message)
            .await?)
    }

    // =========================================================================
    // STATUS
    // =========================================================================

    /// Snapshot of system stats, subsystem counters and traffic rates.
    pub async fn status(&self) -> HandlerStatus {
        HandlerStatus {
            system: SystemStats::collect(self.started),
            components: ComponentStats {
                codec: self.codec.stats().await,
                activation: self.activation.stats().await,
                dry_run: self.dry_run.stats().await,
                quota_remaining: self.quota.remaining(),
            },
            uplinks: self.uplinks.rates(),
            downlinks: self.downlinks.rates(),
            activations: self.activations.rates(),
        }
    }
}
