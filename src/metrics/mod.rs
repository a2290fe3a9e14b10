//! Metrics collection for observability

use prometheus::{
    register_counter_vec_with_registry, register_histogram_vec_with_registry,
    register_histogram_with_registry, register_int_counter_with_registry, CounterVec, Histogram,
    HistogramVec, IntCounter, Opts, Registry,
};
use std::sync::Arc;
use once_cell::sync::Lazy;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Retrieval metrics
    pub retrievals: IntCounter,
    pub retrieval_empty: IntCounter,
    pub retrieval_duration: Histogram,

    // Generation metrics
    pub generation_requests: CounterVec,
    pub generation_duration: HistogramVec,

    // Conversation metrics
    pub turns_recorded: CounterVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let retrievals = register_int_counter_with_registry!(
            Opts::new("retrievals_total", "Total fact retrievals"),
            registry
        )?;

        let retrieval_empty = register_int_counter_with_registry!(
            Opts::new("retrieval_empty_total", "Retrievals that returned no facts"),
            registry
        )?;

        let retrieval_duration = register_histogram_with_registry!(
            "retrieval_duration_seconds",
            "Fact retrieval duration in seconds, including query embedding",
            registry
        )?;

        let generation_requests = register_counter_vec_with_registry!(
            Opts::new("generation_requests_total", "Total generation requests"),
            &["provider", "status"],
            registry
        )?;

        let generation_duration = register_histogram_vec_with_registry!(
            "generation_duration_seconds",
            "Generation request duration in seconds",
            &["provider"],
            registry
        )?;

        let turns_recorded = register_counter_vec_with_registry!(
            Opts::new("conversation_turns_total", "Conversation turns recorded"),
            &["role"],
            registry
        )?;

        Ok(Self {
            registry,
            retrievals,
            retrieval_empty,
            retrieval_duration,
            generation_requests,
            generation_duration,
            turns_recorded,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a completed retrieval
    pub fn record_retrieval(&self, hits: usize, seconds: f64) {
        self.retrievals.inc();
        if hits == 0 {
            self.retrieval_empty.inc();
        }
        self.retrieval_duration.observe(seconds);
    }

    /// Record a generation call
    pub fn record_generation(&self, provider: &str, success: bool, seconds: f64) {
        let status = if success { "success" } else { "error" };
        self.generation_requests
            .with_label_values(&[provider, status])
            .inc();
        self.generation_duration
            .with_label_values(&[provider])
            .observe(seconds);
    }

    /// Record a turn appended to a conversation
    pub fn record_turn(&self, role: &str) {
        self.turns_recorded.with_label_values(&[role]).inc();
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }

        String::from_utf8(buffer).unwrap_or_default()
    }
}
