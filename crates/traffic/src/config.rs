//! Traffic generator configuration

use anyhow::Result;
use serde::Deserialize;

/// Traffic generator configuration, overridable via `TRAFFIC_*` environment
/// variables.
#[derive(Debug, Clone, Deserialize)]
pub struct TrafficConfig {
    /// Prediction endpoint URL
    #[serde(default = "default_model_url")]
    pub model_url: String,

    /// Path of the shared counters file
    #[serde(default = "default_counters_file")]
    pub counters_file: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Lower bound of the random inter-request sleep, in seconds
    #[serde(default = "default_wait_min")]
    pub wait_min_secs: f64,

    /// Upper bound of the random inter-request sleep, in seconds
    #[serde(default = "default_wait_max")]
    pub wait_max_secs: f64,
}

fn default_model_url() -> String {
    "http://127.0.0.1:5001/invocations".to_string()
}

fn default_counters_file() -> String {
    "model_metrics.json".to_string()
}

fn default_request_timeout() -> u64 {
    5
}

fn default_wait_min() -> f64 {
    1.0
}

fn default_wait_max() -> f64 {
    3.0
}

impl TrafficConfig {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("TRAFFIC"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| TrafficConfig {
            model_url: default_model_url(),
            counters_file: default_counters_file(),
            request_timeout_secs: default_request_timeout(),
            wait_min_secs: default_wait_min(),
            wait_max_secs: default_wait_max(),
        }))
    }
}
