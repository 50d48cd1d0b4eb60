//! Metrics collection for observability

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec_with_registry, register_histogram_vec_with_registry,
    register_int_gauge_with_registry, CounterVec, HistogramVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use std::time::Duration;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Ingestion metrics
    pub ingest_runs: CounterVec,
    pub ingest_items: CounterVec,
    pub index_entries: IntGauge,

    // Search metrics
    pub search_requests: CounterVec,
    pub search_fallbacks: CounterVec,

    // Upstream service metrics
    pub upstream_requests: CounterVec,
    pub upstream_request_duration: HistogramVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let ingest_runs = register_counter_vec_with_registry!(
            Opts::new("ingest_runs_total", "Ingestion runs by terminal status"),
            &["status"],
            registry
        )?;

        let ingest_items = register_counter_vec_with_registry!(
            Opts::new("ingest_items_total", "Photos handled by ingestion, by outcome"),
            &["outcome"],
            registry
        )?;

        let index_entries = register_int_gauge_with_registry!(
            Opts::new("index_entries", "Entries currently held in the vector store"),
            registry
        )?;

        let search_requests = register_counter_vec_with_registry!(
            Opts::new("search_requests_total", "Search requests by requested and used mode"),
            &["requested", "used"],
            registry
        )?;

        let search_fallbacks = register_counter_vec_with_registry!(
            Opts::new("search_fallbacks_total", "Smart searches that degraded, by reason"),
            &["reason"],
            registry
        )?;

        let upstream_requests = register_counter_vec_with_registry!(
            Opts::new("upstream_requests_total", "Calls to the vision and embedding services"),
            &["service", "status"],
            registry
        )?;

        let upstream_request_duration = register_histogram_vec_with_registry!(
            "upstream_request_duration_seconds",
            "Upstream request duration in seconds",
            &["service"],
            registry
        )?;

        Ok(Self {
            registry,
            ingest_runs,
            ingest_items,
            index_entries,
            search_requests,
            search_fallbacks,
            upstream_requests,
            upstream_request_duration,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_ingest_run(&self, status: &str) {
        self.ingest_runs.with_label_values(&[status]).inc();
    }

    pub fn record_ingest_item(&self, outcome: &str) {
        self.ingest_items.with_label_values(&[outcome]).inc();
    }

    pub fn set_index_entries(&self, count: usize) {
        self.index_entries.set(count as i64);
    }

    pub fn record_search(&self, requested: &str, used: &str) {
        self.search_requests.with_label_values(&[requested, used]).inc();
    }

    pub fn record_search_fallback(&self, reason: &str) {
        self.search_fallbacks.with_label_values(&[reason]).inc();
    }

    /// Record one upstream call; `elapsed` is absent when no request was sent
    pub fn record_upstream(&self, service: &str, status: &str, elapsed: Option<Duration>) {
        self.upstream_requests.with_label_values(&[service, status]).inc();
        if let Some(elapsed) = elapsed {
            self.upstream_request_duration
                .with_label_values(&[service])
                .observe(elapsed.as_secs_f64());
        }
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}
