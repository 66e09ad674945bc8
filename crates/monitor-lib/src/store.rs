//! Shared counter store
//!
//! A single JSON file holds the request/error/latency aggregates written by
//! the traffic generator after every request and polled by the metrics
//! exporter. The file is the only channel between the two processes; there
//! is no locking, and readers treat an unreadable or partially written file
//! as "no data yet" rather than an error worth dying over.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Request aggregates persisted between runs and shared across processes.
///
/// All fields are monotonically non-decreasing within a run. The field
/// names are the on-disk JSON format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterState {
    /// Total requests attempted since the last reset.
    pub request_count: u64,
    /// Cumulative latency in seconds across all successful requests.
    pub latency_sum: f64,
    /// Number of requests included in `latency_sum`.
    pub latency_count: u64,
    /// Subset of `request_count` that failed (transport error or
    /// non-success status).
    pub error_count: u64,
}

impl CounterState {
    /// Mean latency over successful requests, or `None` when no successful
    /// request has been recorded yet.
    pub fn average_latency(&self) -> Option<f64> {
        if self.latency_count == 0 {
            return None;
        }
        Some(self.latency_sum / self.latency_count as f64)
    }
}

/// Reasons a load can fail. Both are recoverable: the caller keeps its
/// in-memory state and retries on the next cycle.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read counters file: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to parse counters file: {0}")]
    Parse(#[source] serde_json::Error),
}

/// File-backed store for [`CounterState`].
///
/// Holds the last known state in memory so that a failed load leaves the
/// caller with something consistent to report.
#[derive(Debug)]
pub struct CounterStore {
    path: PathBuf,
    state: CounterState,
}

impl CounterStore {
    /// Create a store backed by `path`, starting from a zero state.
    /// Nothing is read or written until [`load`](Self::load) or
    /// [`save`](Self::save) is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: CounterState::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &CounterState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CounterState {
        &mut self.state
    }

    /// Re-read the backing file. On success the in-memory state is replaced
    /// with the file contents. On any read or parse failure the in-memory
    /// state is left unchanged and the error is returned for the caller to
    /// log and absorb.
    pub fn load(&mut self) -> Result<&CounterState, StoreError> {
        let raw = fs::read_to_string(&self.path).map_err(StoreError::Read)?;
        self.state = serde_json::from_str(&raw).map_err(StoreError::Parse)?;
        Ok(&self.state)
    }

    /// Write the full in-memory state over the backing file.
    ///
    /// Goes through a temp file and rename so a crash mid-write leaves the
    /// previous contents intact. A failed save is retried implicitly on the
    /// next cycle; readers tolerate stale contents in the meantime.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_vec(&self.state).context("Failed to serialize counters")?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("Failed to create temp file {:?}", temp_path))?;

        file.write_all(&json).context("Failed to write counters")?;
        file.sync_all().context("Failed to sync counters file")?;

        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, self.path))?;

        Ok(())
    }

    /// Delete the backing file and zero the in-memory state so the next run
    /// starts fresh. A missing file is not an error.
    pub fn reset(&mut self) -> Result<()> {
        self.state = CounterState::default();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to remove counters file {:?}", self.path))
            }
        }
    }
}
