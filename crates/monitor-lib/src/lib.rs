//! Shared library for the model serving monitor
//!
//! This crate provides the pieces shared by the two binaries:
//! - Counter state and its file-backed store (the inter-process channel)
//! - Synthetic prediction payloads
//! - Host resource sampling from /proc
//! - Prometheus gauges and the export loop
//! - The traffic generation loop

pub mod export;
pub mod observability;
pub mod payload;
pub mod store;
pub mod system;
pub mod traffic;

pub use export::ExportLoop;
pub use observability::ExporterGauges;
pub use store::{CounterState, CounterStore, StoreError};
pub use system::{HostSample, HostSampler};
pub use traffic::{Outcome, TrafficGenerator, TrafficSettings};
