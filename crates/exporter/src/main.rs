//! Metrics Exporter - publishes host and model-request metrics
//!
//! Every sampling period this binary reads host statistics from /proc and
//! the counters file written by the traffic generator, and republishes both
//! as Prometheus gauges on the /metrics endpoint.

use anyhow::Result;
use monitor_lib::{CounterStore, ExportLoop, ExporterGauges, HostSampler};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting metrics-exporter");

    let config = config::ExporterConfig::load()?;
    info!(
        port = config.metrics_port,
        counters_file = %config.counters_file,
        interval_secs = config.sample_interval_secs,
        "Exporter configured"
    );

    let gauges = ExporterGauges::new();
    let store = CounterStore::new(&config.counters_file);
    let sampler = HostSampler::new(&config.disk_path);

    let export_loop = ExportLoop::new(
        sampler,
        store,
        gauges,
        Duration::from_secs(config.sample_interval_secs),
    );

    let (shutdown_tx, _) = broadcast::channel(1);
    let loop_handle = tokio::spawn(export_loop.run(shutdown_tx.subscribe()));
    let api_handle = tokio::spawn(api::serve(config.metrics_port));

    tokio::signal::ctrl_c().await?;
    info!("SIGINT received, shutting down");

    let _ = shutdown_tx.send(());
    let _ = loop_handle.await;
    api_handle.abort();

    Ok(())
}
