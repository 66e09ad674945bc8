//! Exporter configuration

use anyhow::Result;
use serde::Deserialize;

/// Exporter configuration, overridable via `EXPORTER_*` environment
/// variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ExporterConfig {
    /// Port for the /metrics and /healthz endpoints
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Path of the shared counters file written by the traffic generator
    #[serde(default = "default_counters_file")]
    pub counters_file: String,

    /// Sampling period in seconds
    #[serde(default = "default_sample_interval")]
    pub sample_interval_secs: u64,

    /// Mount point whose utilization is reported as disk usage
    #[serde(default = "default_disk_path")]
    pub disk_path: String,
}

fn default_metrics_port() -> u16 {
    8000
}

fn default_counters_file() -> String {
    "model_metrics.json".to_string()
}

fn default_sample_interval() -> u64 {
    5
}

fn default_disk_path() -> String {
    "/".to_string()
}

impl ExporterConfig {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("EXPORTER"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| ExporterConfig {
            metrics_port: default_metrics_port(),
            counters_file: default_counters_file(),
            sample_interval_secs: default_sample_interval(),
            disk_path: default_disk_path(),
        }))
    }
}
