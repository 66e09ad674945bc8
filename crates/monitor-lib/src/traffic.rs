//! Synthetic traffic against the prediction endpoint
//!
//! One request per iteration: synthesize a payload, POST it with a bounded
//! timeout, classify the outcome, fold it into the shared counters, persist,
//! then sleep a random interval. No error here is fatal; failures are
//! absorbed into the counters and the inter-request sleep throttles retry
//! pressure.

use crate::payload;
use crate::store::{CounterState, CounterStore};
use anyhow::{Context, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{info, warn};

/// Classification of one request attempt. Exactly one per attempt.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Transport succeeded and the status indicates success.
    Success {
        status: u16,
        latency: Duration,
        body: String,
    },
    /// Transport succeeded but the model answered with a failure status.
    ApplicationError {
        status: u16,
        latency: Duration,
        body: String,
    },
    /// The endpoint was unreachable.
    ConnectionError,
    /// Anything else, including timeouts.
    OtherError { reason: String },
}

impl Outcome {
    /// Fold this outcome into the counters. Every outcome counts as a
    /// request; only success feeds the latency aggregates; everything else
    /// counts as an error.
    pub fn apply(&self, counters: &mut CounterState) {
        counters.request_count += 1;
        match self {
            Outcome::Success { latency, .. } => {
                counters.latency_sum += latency.as_secs_f64();
                counters.latency_count += 1;
            }
            Outcome::ApplicationError { .. }
            | Outcome::ConnectionError
            | Outcome::OtherError { .. } => {
                counters.error_count += 1;
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// Tunables for the traffic loop.
#[derive(Debug, Clone)]
pub struct TrafficSettings {
    /// Prediction endpoint URL.
    pub model_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Lower bound of the inter-request sleep.
    pub wait_min: Duration,
    /// Upper bound of the inter-request sleep.
    pub wait_max: Duration,
}

/// Issues synthetic prediction requests and keeps the counter store current.
pub struct TrafficGenerator {
    client: reqwest::Client,
    settings: TrafficSettings,
    store: CounterStore,
    rng: SmallRng,
}

impl TrafficGenerator {
    pub fn new(settings: TrafficSettings, store: CounterStore) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            settings,
            store,
            rng: SmallRng::from_entropy(),
        })
    }

    pub fn counters(&self) -> &CounterState {
        self.store.state()
    }

    /// One full iteration: synthesize, send, count, persist. Returns the
    /// classified outcome so callers can log it.
    pub async fn run_once(&mut self) -> Outcome {
        let request = payload::synthesize(&mut self.rng);
        let outcome = self.send(&request).await;

        outcome.apply(self.store.state_mut());
        if let Err(e) = self.store.save() {
            warn!(error = %e, "Failed to persist counters, will retry next cycle");
        }

        outcome
    }

    async fn send(&self, request: &payload::PredictionRequest) -> Outcome {
        let start = Instant::now();

        match self
            .client
            .post(&self.settings.model_url)
            .json(request)
            .send()
            .await
        {
            Ok(response) => {
                let latency = start.elapsed();
                let status = response.status();
                let body = response.text().await.unwrap_or_default();

                if status.is_success() {
                    Outcome::Success {
                        status: status.as_u16(),
                        latency,
                        body,
                    }
                } else {
                    Outcome::ApplicationError {
                        status: status.as_u16(),
                        latency,
                        body,
                    }
                }
            }
            Err(e) if e.is_connect() => Outcome::ConnectionError,
            Err(e) => Outcome::OtherError {
                reason: e.to_string(),
            },
        }
    }

    /// Run until the shutdown channel fires. Returns the final counters for
    /// the caller's summary.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> CounterState {
        info!(
            url = %self.settings.model_url,
            counters_file = %self.store.path().display(),
            "Starting traffic loop"
        );

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                outcome = self.run_once() => {
                    self.log_outcome(&outcome);

                    let wait = self.rng.gen_range(
                        self.settings.wait_min.as_secs_f64()..=self.settings.wait_max.as_secs_f64(),
                    );
                    tokio::select! {
                        _ = shutdown.recv() => break,
                        _ = tokio::time::sleep(Duration::from_secs_f64(wait)) => {}
                    }
                }
            }
        }

        info!("Stopping traffic loop");
        *self.store.state()
    }

    fn log_outcome(&self, outcome: &Outcome) {
        let request = self.store.state().request_count;
        match outcome {
            Outcome::Success {
                status,
                latency,
                body,
            } => {
                info!(
                    request,
                    status,
                    latency_secs = latency.as_secs_f64(),
                    prediction = %truncate(body, 100),
                    "Request succeeded"
                );
            }
            Outcome::ApplicationError {
                status,
                latency,
                body,
            } => {
                warn!(
                    request,
                    status,
                    latency_secs = latency.as_secs_f64(),
                    body = %truncate(body, 100),
                    "Model returned an error status"
                );
            }
            Outcome::ConnectionError => {
                warn!(
                    request,
                    url = %self.settings.model_url,
                    "Model endpoint unreachable, is the serving process running?"
                );
            }
            Outcome::OtherError { reason } => {
                warn!(request, error = %reason, "Request failed");
            }
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
