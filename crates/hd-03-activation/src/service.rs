//! # Activation Coordinator
//!
//! Drives one join handshake through its phases:
//!
//! ```text
//! Received → Resolving → Deriving → [Encoding] → Responding
//! ```
//!
//! Everything before Encoding is fatal on failure. Encoding failures degrade
//! the response to an empty payload with diagnostic logs. No state is kept
//! between requests apart from statistics.

use crate::domain::entities::{
    ActivationPhase, ActivationRequest, ActivationResponse, ActivationStats, ChallengeRequest,
    ChallengeResponse,
};
use crate::domain::strategy::StrategyTable;
use crate::errors::ActivationError;
use crate::ports::inbound::ActivationApi;
use crate::ports::outbound::{bounded, DeviceRegistry, PayloadCodecApi};
use async_trait::async_trait;
use serde_json::Value;
use shared_types::{AppId, Application, DevId, Device, LogEntry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Coordinator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationConfig {
    /// Ceiling for each registry call.
    pub registry_timeout: Duration,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            registry_timeout: Duration::from_secs(2),
        }
    }
}

/// Encoded activation downlink, or the diagnostics of its failure.
struct Encoded {
    payload: Vec<u8>,
    port: Option<u8>,
    logs: Vec<LogEntry>,
    degraded: bool,
}

/// The activation coordinator.
pub struct ActivationCoordinator {
    config: ActivationConfig,
    registry: Arc<dyn DeviceRegistry>,
    codec: Arc<dyn PayloadCodecApi>,
    strategies: StrategyTable,
    stats: Arc<RwLock<ActivationStats>>,
}

impl ActivationCoordinator {
    /// Create a coordinator with the built-in strategies.
    pub fn new(
        registry: Arc<dyn DeviceRegistry>,
        codec: Arc<dyn PayloadCodecApi>,
        config: ActivationConfig,
    ) -> Self {
        Self::with_strategies(registry, codec, StrategyTable::with_defaults(), config)
    }

    /// Create a coordinator with a custom strategy table.
    pub fn with_strategies(
        registry: Arc<dyn DeviceRegistry>,
        codec: Arc<dyn PayloadCodecApi>,
        strategies: StrategyTable,
        config: ActivationConfig,
    ) -> Self {
        Self {
            config,
            registry,
            codec,
            strategies,
            stats: Arc::new(RwLock::new(ActivationStats::default())),
        }
    }

    /// Get current statistics.
    pub async fn stats(&self) -> ActivationStats {
        self.stats.read().await.clone()
    }

    async fn resolve_device(&self, app_id: &AppId, dev_id: &DevId) -> Result<Device, ActivationError> {
        bounded(
            self.config.registry_timeout,
            self.registry.get_device(app_id, dev_id),
        )
        .await?
        .ok_or_else(|| ActivationError::UnknownDevice {
            app_id: app_id.clone(),
            dev_id: dev_id.clone(),
        })
    }

    async fn resolve_application(&self, app_id: &AppId) -> Result<Application, ActivationError> {
        bounded(
            self.config.registry_timeout,
            self.registry.get_application(app_id),
        )
        .await?
        .ok_or_else(|| ActivationError::UnknownApplication(app_id.clone()))
    }

    /// Runs every phase up to Responding.
    async fn run(&self, request: ActivationRequest) -> Result<ActivationResponse, ActivationError> {
        debug!(phase = %ActivationPhase::Received);
        let downlink_option = request
            .best_downlink_option()
            .cloned()
            .ok_or(ActivationError::NoDownlinkOption)?;

        debug!(phase = %ActivationPhase::Resolving);
        let device = self.resolve_device(&request.app_id, &request.dev_id).await?;
        let application = self.resolve_application(&request.app_id).await?;

        debug!(phase = %ActivationPhase::Deriving, kind = %device.kind());
        if request.metadata.kind() != device.kind() {
            return Err(ActivationError::MetadataMismatch {
                expected: device.kind(),
                found: request.metadata.kind(),
            });
        }
        let strategy = self.strategies.get(device.kind())?;
        let derivation = strategy.derive(&device, &request)?;
        bounded(
            self.config.registry_timeout,
            self.registry.set_device(derivation.device),
        )
        .await?;

        let encoded = self.encode_activation_downlink(&application).await;

        debug!(phase = %ActivationPhase::Responding);
        info!(dev_addr = %derivation.envelope.dev_addr, degraded = encoded.degraded, "device activated");

        Ok(ActivationResponse {
            activation_id: Uuid::new_v4(),
            payload: encoded.payload,
            port: encoded.port,
            envelope: derivation.envelope,
            downlink_option,
            metadata: request.metadata,
            logs: encoded.logs,
            degraded: encoded.degraded,
        })
    }

    /// Encoding phase. Never fails the activation.
    async fn encode_activation_downlink(&self, application: &Application) -> Encoded {
        let Some(downlink) = application.activation_downlink.clone() else {
            return Encoded {
                payload: Vec::new(),
                port: None,
                logs: Vec::new(),
                degraded: false,
            };
        };

        debug!(phase = %ActivationPhase::Encoding, port = downlink.port);
        match self
            .codec
            .encode_downlink(application.functions.clone(), downlink.payload, downlink.port)
            .await
        {
            Ok(out) => Encoded {
                payload: out.payload,
                port: Some(downlink.port),
                logs: out.logs,
                degraded: false,
            },
            Err(err) => {
                warn!(error = %err, "activation downlink could not be encoded");
                let diagnostic = Value::String(err.to_string()).to_string();
                let mut logs = err.into_logs();
                logs.push(LogEntry::new("encoder", vec![diagnostic]));
                Encoded {
                    payload: Vec::new(),
                    port: Some(downlink.port),
                    logs,
                    degraded: true,
                }
            }
        }
    }
}

#[async_trait]
impl ActivationApi for ActivationCoordinator {
    #[instrument(skip_all, fields(app_id = %request.app_id, dev_id = %request.dev_id))]
    async fn activate(
        &self,
        request: ActivationRequest,
    ) -> Result<ActivationResponse, ActivationError> {
        self.stats.write().await.attempts += 1;

        let result = self.run(request).await;

        let mut stats = self.stats.write().await;
        match &result {
            Ok(response) => {
                stats.successes += 1;
                if response.degraded {
                    stats.degraded += 1;
                }
            }
            Err(err) => {
                warn!(phase = %err.phase(), retryable = err.is_retryable(), error = %err, "activation failed");
                stats.failures += 1;
                if err.is_retryable() {
                    stats.retryable_failures += 1;
                }
            }
        }
        result
    }

    #[instrument(skip_all, fields(app_id = %request.app_id, dev_id = %request.dev_id))]
    async fn challenge(
        &self,
        request: ChallengeRequest,
    ) -> Result<ChallengeResponse, ActivationError> {
        let device = self.resolve_device(&request.app_id, &request.dev_id).await?;
        let strategy = self.strategies.get(device.kind())?;
        let response = strategy.challenge(&device, &request.payload)?;
        debug!(matches = response.matches, "challenge evaluated");
        Ok(response)
    }
}
