//! # Payload Codec Service
//!
//! Async façade over [`PayloadCodecPipeline`]. Each call moves one pipeline
//! run onto tokio's blocking pool and records statistics.

use crate::domain::entities::{
    CodecStats, DownlinkOutput, ProcessedDownlink, ProcessedUplink, UplinkOutput,
};
use crate::errors::CodecError;
use crate::pipeline::PayloadCodecPipeline;
use crate::ports::inbound::PayloadCodecApi;
use crate::ports::outbound::{bounded, DeviceRegistry};
use async_trait::async_trait;
use hd_01_script_sandbox::domain::SandboxLimits;
use hd_01_script_sandbox::engine::ScriptSandbox;
use hd_01_script_sandbox::ports::ScriptRunner;
use shared_types::{
    AppId, Application, DownlinkMessage, DownlinkPayload, PayloadFunctions, UplinkMessage,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

/// Codec service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Sandbox limits for every function run.
    pub limits: SandboxLimits,
    /// Ceiling for registry lookups.
    pub registry_timeout: Duration,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            limits: SandboxLimits::default(),
            registry_timeout: Duration::from_secs(2),
        }
    }
}

/// Payload codec service.
pub struct PayloadCodecService<R: ScriptRunner + 'static = ScriptSandbox> {
    pipeline: Arc<PayloadCodecPipeline<R>>,
    registry_timeout: Duration,
    stats: Arc<RwLock<CodecStats>>,
}

impl PayloadCodecService<ScriptSandbox> {
    /// Creates a service backed by the script sandbox.
    #[must_use]
    pub fn new(config: CodecConfig) -> Self {
        Self::with_runner(ScriptSandbox::new(config.limits), config.registry_timeout)
    }
}

impl<R: ScriptRunner + 'static> PayloadCodecService<R> {
    /// Creates a service with a custom runner.
    pub fn with_runner(runner: R, registry_timeout: Duration) -> Self {
        Self {
            pipeline: Arc::new(PayloadCodecPipeline::new(runner)),
            registry_timeout,
            stats: Arc::new(RwLock::new(CodecStats::default())),
        }
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> CodecStats {
        self.stats.read().await.clone()
    }

    async fn resolve(
        &self,
        registry: &dyn DeviceRegistry,
        app_id: &AppId,
    ) -> Result<Application, CodecError> {
        bounded(self.registry_timeout, registry.get_application(app_id))
            .await?
            .ok_or_else(|| CodecError::UnknownApplication(app_id.clone()))
    }

    async fn record_failure(&self, err: &CodecError) {
        let mut stats = self.stats.write().await;
        stats.failures += 1;
        if err.is_timeout() {
            stats.timeouts += 1;
        }
    }
}

#[async_trait]
impl<R: ScriptRunner + 'static> PayloadCodecApi for PayloadCodecService<R> {
    #[instrument(skip(self, functions, payload), fields(len = payload.len()))]
    async fn decode_uplink(
        &self,
        functions: PayloadFunctions,
        payload: Vec<u8>,
        port: u8,
    ) -> Result<UplinkOutput, CodecError> {
        self.stats.write().await.uplinks += 1;

        let pipeline = Arc::clone(&self.pipeline);
        let result = tokio::task::spawn_blocking(move || pipeline.uplink(&functions, &payload, port))
            .await
            .map_err(|e| CodecError::Worker(e.to_string()))
            .and_then(|r| r);

        match &result {
            Ok(out) if !out.valid => {
                debug!(port, "uplink rejected by validator");
                self.stats.write().await.invalid += 1;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(port, error = %err, "uplink pipeline failed");
                self.record_failure(err).await;
            }
        }
        result
    }

    #[instrument(skip(self, functions, payload))]
    async fn encode_downlink(
        &self,
        functions: PayloadFunctions,
        payload: DownlinkPayload,
        port: u8,
    ) -> Result<DownlinkOutput, CodecError> {
        self.stats.write().await.downlinks += 1;

        let pipeline = Arc::clone(&self.pipeline);
        let result =
            tokio::task::spawn_blocking(move || pipeline.downlink(&functions, payload, port))
                .await
                .map_err(|e| CodecError::Worker(e.to_string()))
                .and_then(|r| r);

        if let Err(err) = &result {
            warn!(port, error = %err, "downlink pipeline failed");
            self.record_failure(err).await;
        }
        result
    }

    #[instrument(skip_all, fields(app_id = %message.app_id, dev_id = %message.dev_id))]
    async fn process_uplink(
        &self,
        registry: &dyn DeviceRegistry,
        message: UplinkMessage,
    ) -> Result<ProcessedUplink, CodecError> {
        let application = self.resolve(registry, &message.app_id).await?;
        let out = self
            .decode_uplink(application.functions, message.payload, message.port)
            .await?;

        Ok(ProcessedUplink {
            app_id: message.app_id,
            dev_id: message.dev_id,
            port: message.port,
            payload: out.payload,
            fields: out.fields,
            valid: out.valid,
        })
    }

    #[instrument(skip_all, fields(app_id = %message.app_id, dev_id = %message.dev_id))]
    async fn process_downlink(
        &self,
        registry: &dyn DeviceRegistry,
        message: DownlinkMessage,
    ) -> Result<ProcessedDownlink, CodecError> {
        let application = self.resolve(registry, &message.app_id).await?;
        let out = self
            .encode_downlink(application.functions, message.payload, message.port)
            .await?;

        Ok(ProcessedDownlink {
            app_id: message.app_id,
            dev_id: message.dev_id,
            port: message.port,
            payload: out.payload,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
