//! # Dry-Run Engine
//!
//! Runs the codec pipelines against caller-supplied functions with no
//! registry and no coordinator involved.

use crate::domain::entities::{
    DryDownlinkRequest, DryDownlinkResult, DryRunStats, DryUplinkRequest, DryUplinkResult,
};
use crate::errors::DryRunError;
use crate::ports::inbound::DryRunApi;
use crate::ports::PayloadCodecApi;
use async_trait::async_trait;
use serde_json::Value;
use shared_types::DownlinkPayload;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Dry-run harness over a codec.
pub struct DryRunEngine {
    codec: Arc<dyn PayloadCodecApi>,
    stats: Arc<RwLock<DryRunStats>>,
}

impl DryRunEngine {
    /// Creates an engine running pipelines through `codec`.
    pub fn new(codec: Arc<dyn PayloadCodecApi>) -> Self {
        Self {
            codec,
            stats: Arc::new(RwLock::new(DryRunStats::default())),
        }
    }

    /// Get current statistics.
    pub async fn stats(&self) -> DryRunStats {
        self.stats.read().await.clone()
    }

    async fn record(&self, uplink: bool, failed: bool) {
        let mut stats = self.stats.write().await;
        if uplink {
            stats.uplinks += 1;
        } else {
            stats.downlinks += 1;
        }
        if failed {
            stats.errors += 1;
        }
    }
}

/// Interprets the payload/fields pair of a downlink request.
pub fn downlink_body(request: &DryDownlinkRequest) -> Result<DownlinkPayload, DryRunError> {
    let fields = request
        .fields
        .as_deref()
        .filter(|text| !text.trim().is_empty());

    let Some(text) = fields else {
        return Ok(DownlinkPayload::Raw(request.payload.clone()));
    };
    if !request.payload.is_empty() {
        return Err(DryRunError::PayloadAndFields);
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(fields)) => Ok(DownlinkPayload::Fields(fields)),
        Ok(other) => Err(DryRunError::FieldsNotObject(json_kind(&other).to_string())),
        Err(err) => Err(DryRunError::InvalidFields(err.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl DryRunApi for DryRunEngine {
    #[instrument(skip_all, fields(port = request.port, len = request.payload.len()))]
    async fn dry_uplink(&self, request: DryUplinkRequest) -> DryUplinkResult {
        let payload = request.payload.clone();
        let result = match self
            .codec
            .decode_uplink(request.app, request.payload, request.port)
            .await
        {
            Ok(out) => DryUplinkResult {
                payload: out.payload,
                fields: Value::Object(out.fields),
                valid: out.valid,
                logs: out.logs,
                error: None,
            },
            Err(err) => {
                debug!(error = %err, "dry uplink failed");
                let error = err.to_string();
                DryUplinkResult {
                    payload,
                    fields: Value::Object(serde_json::Map::new()),
                    valid: false,
                    logs: err.into_logs(),
                    error: Some(error),
                }
            }
        };

        self.record(true, result.error.is_some()).await;
        result
    }

    #[instrument(skip_all, fields(port = request.port))]
    async fn dry_downlink(&self, request: DryDownlinkRequest) -> DryDownlinkResult {
        let result = match downlink_body(&request) {
            Err(err) => DryDownlinkResult::failed(err, Vec::new()),
            Ok(body) => match self
                .codec
                .encode_downlink(request.app, body, request.port)
                .await
            {
                Ok(out) => DryDownlinkResult {
                    payload: out.payload,
                    logs: out.logs,
                    error: None,
                },
                Err(err) => {
                    debug!(error = %err, "dry downlink failed");
                    let error = err.to_string();
                    DryDownlinkResult::failed(error, err.into_logs())
                }
            },
        };

        self.record(false, result.error.is_some()).await;
        result
    }
}
