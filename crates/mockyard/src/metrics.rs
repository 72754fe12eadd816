//! Prometheus metrics for mockyard.
//!
//! Tracks mock traffic, dispatch latency, definition reloads and the number
//! of open alerts.
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};

lazy_static! {
    /// Total number of requests received by the mock server
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "mockyard_requests_total",
        "Total number of requests received by the mock server",
        &["method", "outcome"]  // outcome: responded|unhandled|failed
    )
    .unwrap();

    /// Dispatch duration, including configured delays
    pub static ref DISPATCH_DURATION_MS: HistogramVec = register_histogram_vec!(
        "mockyard_dispatch_duration_ms",
        "Histogram of request dispatch time in milliseconds",
        &["outcome"],
        vec![0.5, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap();

    /// Definition loads
    pub static ref DEFINITION_LOADS_TOTAL: CounterVec = register_counter_vec!(
        "mockyard_definition_loads_total",
        "Total number of route/collection definition loads",
        &["result"]  // result: applied|rejected
    )
    .unwrap();

    /// Open alerts
    pub static ref ALERTS: Gauge = register_gauge!(
        "mockyard_alerts",
        "Number of alerts currently raised"
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record one handled request
pub fn record_request(method: &str, outcome: &str, duration_ms: f64) {
    REQUESTS_TOTAL.with_label_values(&[method, outcome]).inc();
    DISPATCH_DURATION_MS
        .with_label_values(&[outcome])
        .observe(duration_ms);
}

/// Record a definitions load
pub fn record_definition_load(applied: bool) {
    let result = if applied { "applied" } else { "rejected" };
    DEFINITION_LOADS_TOTAL.with_label_values(&[result]).inc();
}

/// Publish the current number of alerts
pub fn set_alerts(total: usize) {
    ALERTS.set(total as f64);
}
