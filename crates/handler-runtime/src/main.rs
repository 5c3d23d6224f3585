//! # LoRaWAN Handler
//!
//! Entry point of the handler process. The broker and registry transports
//! are attached by the deployment; this binary runs the core against the
//! in-memory registry.

use std::sync::Arc;

use anyhow::{Context, Result};
use handler_runtime::prelude::*;
use shared_types::InMemoryRegistry;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = HandlerConfig::from_env();
    config.validate().context("invalid handler configuration")?;

    init_tracing(&config.telemetry).context("failed to initialize tracing")?;

    let registry = Arc::new(InMemoryRegistry::new());
    let service = HandlerService::new(&config, registry);

    let status = service.status().await;
    info!(
        version = %status.system.version,
        pid = status.system.pid,
        cpus = status.system.cpus,
        "handler is running. Press Ctrl+C to stop."
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    let status = service.status().await;
    info!(
        uplinks = status.uplinks.total,
        downlinks = status.downlinks.total,
        activations = status.activations.total,
        "handler stopped"
    );
    Ok(())
}
