//! Traffic Generator - synthetic load against the prediction endpoint
//!
//! Deletes any previous counters file, then loops: synthesize a payload,
//! POST it, classify the outcome, persist the counters. Runs until SIGINT,
//! then logs a final summary.

use anyhow::Result;
use monitor_lib::{CounterStore, TrafficGenerator, TrafficSettings};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting traffic-gen");

    let config = config::TrafficConfig::load()?;
    info!(
        url = %config.model_url,
        counters_file = %config.counters_file,
        "Traffic generator configured"
    );

    let mut store = CounterStore::new(&config.counters_file);
    store.reset()?;
    info!("Reset counters file, starting fresh from zero");

    let settings = TrafficSettings {
        model_url: config.model_url,
        request_timeout: Duration::from_secs(config.request_timeout_secs),
        wait_min: Duration::from_secs_f64(config.wait_min_secs),
        wait_max: Duration::from_secs_f64(config.wait_max_secs),
    };
    let generator = TrafficGenerator::new(settings, store)?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let handle = tokio::spawn(generator.run(shutdown_tx.subscribe()));

    tokio::signal::ctrl_c().await?;
    info!("SIGINT received, shutting down");
    let _ = shutdown_tx.send(());

    let final_counters = handle.await?;
    match final_counters.average_latency() {
        Some(avg) => info!(
            total_requests = final_counters.request_count,
            total_errors = final_counters.error_count,
            average_latency_secs = avg,
            "Final summary"
        ),
        None => info!(
            total_requests = final_counters.request_count,
            total_errors = final_counters.error_count,
            average_latency = "no data",
            "Final summary"
        ),
    }

    Ok(())
}
