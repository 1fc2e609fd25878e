//! Observability infrastructure for the exporter itself
//!
//! Provides:
//! - Prometheus self-metrics (scrape latency, tracked autoscalers, watch events)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for scrape rendering (in seconds)
const SCRAPE_BUCKETS: &[f64] = &[
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ExporterMetricsInner> = OnceLock::new();

struct ExporterMetricsInner {
    scrape_duration_seconds: Histogram,
    autoscalers_tracked: IntGauge,
    families_rendered: IntGauge,
    watch_events: IntCounterVec,
    watch_errors: IntCounter,
}

impl ExporterMetricsInner {
    fn new() -> Self {
        Self {
            scrape_duration_seconds: register_histogram!(
                "hpa_exporter_scrape_duration_seconds",
                "Time spent rendering autoscaler metric families for one scrape",
                SCRAPE_BUCKETS.to_vec()
            )
            .expect("Failed to register scrape_duration_seconds"),

            autoscalers_tracked: register_int_gauge!(
                "hpa_exporter_autoscalers_tracked",
                "Number of autoscaler snapshots currently held in the store"
            )
            .expect("Failed to register autoscalers_tracked"),

            families_rendered: register_int_gauge!(
                "hpa_exporter_families_rendered",
                "Number of non-empty metric families in the last scrape"
            )
            .expect("Failed to register families_rendered"),

            watch_events: register_int_counter_vec!(
                "hpa_exporter_watch_events_total",
                "Watch events applied to the autoscaler store",
                &["event"]
            )
            .expect("Failed to register watch_events_total"),

            watch_errors: register_int_counter!(
                "hpa_exporter_watch_errors_total",
                "Errors returned by the autoscaler watch stream"
            )
            .expect("Failed to register watch_errors_total"),
        }
    }
}

/// Watch event labels for [`ExporterMetrics::inc_watch_event`]
pub mod watch_events {
    pub const APPLIED: &str = "applied";
    pub const DELETED: &str = "deleted";
    pub const RESTARTED: &str = "restarted";
}

/// Handle to the exporter's self-metrics
///
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ExporterMetrics {
    _private: (),
}

impl Default for ExporterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ExporterMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ExporterMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ExporterMetricsInner {
        GLOBAL_METRICS.get_or_init(ExporterMetricsInner::new)
    }

    pub fn observe_scrape_duration(&self, duration_secs: f64) {
        self.inner().scrape_duration_seconds.observe(duration_secs);
    }

    pub fn set_autoscalers_tracked(&self, count: i64) {
        self.inner().autoscalers_tracked.set(count);
    }

    pub fn set_families_rendered(&self, count: i64) {
        self.inner().families_rendered.set(count);
    }

    pub fn inc_watch_event(&self, event: &str) {
        self.inner().watch_events.with_label_values(&[event]).inc();
    }

    pub fn inc_watch_errors(&self) {
        self.inner().watch_errors.inc();
    }
}

/// Structured logger for exporter lifecycle events
#[derive(Clone)]
pub struct StructuredLogger {
    node_name: String,
}

impl StructuredLogger {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    pub fn log_startup(&self, version: &str, namespace: Option<&str>, families: usize) {
        info!(
            event = "exporter_started",
            node = %self.node_name,
            exporter_version = %version,
            namespace = namespace.unwrap_or("<all>"),
            families = families,
            "HPA exporter started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "exporter_shutdown",
            node = %self.node_name,
            reason = %reason,
            "HPA exporter shutting down"
        );
    }

    /// Log a completed (re)list of autoscalers
    pub fn log_watch_restarted(&self, autoscalers: usize) {
        info!(
            event = "watch_restarted",
            node = %self.node_name,
            autoscalers = autoscalers,
            "Autoscaler list synced"
        );
    }

    pub fn log_watch_error(&self, error: &str) {
        warn!(
            event = "watch_error",
            node = %self.node_name,
            error = %error,
            "Autoscaler watch failed, retrying with backoff"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exporter_metrics_creation() {
        // Metrics live in the global registry; repeated handles share them
        let metrics = ExporterMetrics::new();
        let other = ExporterMetrics::new();

        metrics.observe_scrape_duration(0.002);
        metrics.set_autoscalers_tracked(3);
        other.set_families_rendered(9);
        metrics.inc_watch_event(watch_events::APPLIED);
        metrics.inc_watch_errors();

        let gathered = prometheus::gather();
        assert!(gathered
            .iter()
            .any(|f| f.get_name() == "hpa_exporter_autoscalers_tracked"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-node");
        assert_eq!(logger.node_name, "test-node");
        logger.log_startup("0.1.0", None, 9);
    }
}
