//! Prometheus gauges published by the metrics exporter
//!
//! Every metric is a gauge: the scrape contract is "last written value",
//! including the request counters mirrored from the shared counters file.
//! Gauges are registered once in the process-global registry; the handle
//! struct is a cheap clone over that singleton.

use crate::store::CounterState;
use crate::system::HostSample;
use prometheus::{register_gauge, register_int_gauge, Gauge, IntGauge};
use std::sync::OnceLock;

static GLOBAL_GAUGES: OnceLock<ExporterGaugesInner> = OnceLock::new();

struct ExporterGaugesInner {
    system_cpu_usage: Gauge,
    system_ram_usage: Gauge,
    system_disk_usage: Gauge,
    network_sent_bytes: IntGauge,
    network_recv_bytes: IntGauge,
    process_memory_usage_bytes: IntGauge,
    active_threads_count: IntGauge,
    http_requests_total: IntGauge,
    model_errors_total: IntGauge,
    model_latency_seconds_sum: Gauge,
    model_latency_seconds_count: IntGauge,
}

impl ExporterGaugesInner {
    fn new() -> Self {
        Self {
            system_cpu_usage: register_gauge!("system_cpu_usage", "CPU utilization percentage")
                .expect("Failed to register system_cpu_usage"),

            system_ram_usage: register_gauge!("system_ram_usage", "Memory utilization percentage")
                .expect("Failed to register system_ram_usage"),

            system_disk_usage: register_gauge!(
                "system_disk_usage",
                "Disk utilization percentage of the monitored mount"
            )
            .expect("Failed to register system_disk_usage"),

            network_sent_bytes: register_int_gauge!(
                "network_sent_bytes",
                "Cumulative bytes sent across all interfaces"
            )
            .expect("Failed to register network_sent_bytes"),

            network_recv_bytes: register_int_gauge!(
                "network_recv_bytes",
                "Cumulative bytes received across all interfaces"
            )
            .expect("Failed to register network_recv_bytes"),

            process_memory_usage_bytes: register_int_gauge!(
                "process_memory_usage_bytes",
                "Resident memory of the exporter process"
            )
            .expect("Failed to register process_memory_usage_bytes"),

            active_threads_count: register_int_gauge!(
                "active_threads_count",
                "Thread count of the exporter process"
            )
            .expect("Failed to register active_threads_count"),

            http_requests_total: register_int_gauge!(
                "http_requests_total",
                "Total requests sent to the model endpoint"
            )
            .expect("Failed to register http_requests_total"),

            model_errors_total: register_int_gauge!(
                "model_errors_total",
                "Total failed requests to the model endpoint"
            )
            .expect("Failed to register model_errors_total"),

            model_latency_seconds_sum: register_gauge!(
                "model_latency_seconds_sum",
                "Cumulative latency of successful model requests"
            )
            .expect("Failed to register model_latency_seconds_sum"),

            model_latency_seconds_count: register_int_gauge!(
                "model_latency_seconds_count",
                "Number of requests included in the latency sum"
            )
            .expect("Failed to register model_latency_seconds_count"),
        }
    }
}

/// Handle to the exporter's gauge set. Clones share the same underlying
/// registered metrics.
#[derive(Clone)]
pub struct ExporterGauges {
    _private: (),
}

impl Default for ExporterGauges {
    fn default() -> Self {
        Self::new()
    }
}

impl ExporterGauges {
    /// Create a handle, registering the gauges on first call.
    pub fn new() -> Self {
        GLOBAL_GAUGES.get_or_init(ExporterGaugesInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ExporterGaugesInner {
        GLOBAL_GAUGES.get().expect("Gauges not initialized")
    }

    /// Publish one host snapshot.
    pub fn set_host(&self, sample: &HostSample) {
        let g = self.inner();
        g.system_cpu_usage.set(sample.cpu_percent);
        g.system_ram_usage.set(sample.memory_percent);
        g.system_disk_usage.set(sample.disk_percent);
        g.network_sent_bytes.set(sample.net_sent_bytes as i64);
        g.network_recv_bytes.set(sample.net_recv_bytes as i64);
        g.process_memory_usage_bytes
            .set(sample.process_rss_bytes as i64);
        g.active_threads_count.set(sample.process_threads as i64);
    }

    /// Mirror the request counters from a loaded [`CounterState`]. When a
    /// load fails this is simply not called, so the previously published
    /// values stay in place.
    pub fn set_counters(&self, state: &CounterState) {
        let g = self.inner();
        g.http_requests_total.set(state.request_count as i64);
        g.model_errors_total.set(state.error_count as i64);
        g.model_latency_seconds_sum.set(state.latency_sum);
        g.model_latency_seconds_count.set(state.latency_count as i64);
    }
}
