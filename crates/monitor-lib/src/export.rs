//! Metrics export loop
//!
//! On a fixed period, snapshots host resource usage and the shared counter
//! store and publishes both through the Prometheus gauges. A failed counter
//! load leaves the previously published request gauges untouched; the
//! /metrics endpoint stays available throughout.

use crate::observability::ExporterGauges;
use crate::store::CounterStore;
use crate::system::HostSampler;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::interval;
use tracing::{debug, info, warn};

/// Periodic sampler feeding the exporter's gauges.
pub struct ExportLoop {
    sampler: HostSampler,
    store: CounterStore,
    gauges: ExporterGauges,
    period: Duration,
}

impl ExportLoop {
    pub fn new(
        sampler: HostSampler,
        store: CounterStore,
        gauges: ExporterGauges,
        period: Duration,
    ) -> Self {
        Self {
            sampler,
            store,
            gauges,
            period,
        }
    }

    /// Run until the shutdown channel fires.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            period_secs = self.period.as_secs(),
            counters_file = %self.store.path().display(),
            "Starting export loop"
        );

        let mut ticker = interval(self.period);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick(),
                _ = shutdown.recv() => {
                    info!("Stopping export loop");
                    break;
                }
            }
        }
    }

    /// One export cycle. Host stats and counters are sampled independently;
    /// a failure in either leaves the other's gauges updated.
    pub fn tick(&mut self) {
        match self.sampler.sample() {
            Ok(sample) => self.gauges.set_host(&sample),
            Err(e) => warn!(error = %e, "Failed to sample host statistics"),
        }

        match self.store.load() {
            Ok(state) => self.gauges.set_counters(state),
            Err(e) => {
                // Missing file just means the traffic generator has not
                // written yet; keep the last published values.
                debug!(error = %e, "Counters not readable, keeping last published values");
            }
        }
    }
}
