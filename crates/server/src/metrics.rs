//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the torrhub server:
//! - HTTP request metrics (latency, counts, errors)
//! - Engine status (collected dynamically)
//! - Core session metrics, registered from `torrhub_core::metrics`

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use torrhub_core::ConnectionState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "torrhub_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("torrhub_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "torrhub_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Engine Metrics (collected dynamically)
// =============================================================================

/// Swarm connection state, 1 for the current state and 0 for the others.
pub static CONNECTION_STATE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "torrhub_connection_state",
            "Current swarm connection state",
        ),
        &["state"],
    )
    .unwrap()
});

/// Background hydrations currently running.
pub static HYDRATIONS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "torrhub_hydrations_in_flight",
        "Number of catalog-to-live hydrations in flight",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Engine
    registry
        .register(Box::new(CONNECTION_STATE.clone()))
        .unwrap();
    registry
        .register(Box::new(HYDRATIONS_IN_FLIGHT.clone()))
        .unwrap();

    // Core metrics (sessions, reconfiguration, preload)
    for metric in torrhub_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the engine as it is now.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let engine = state.engine();

    let current = engine.connection_state();
    for candidate in [
        ConnectionState::Connected,
        ConnectionState::Disconnecting,
        ConnectionState::Disconnected,
        ConnectionState::Reconnecting,
    ] {
        CONNECTION_STATE
            .with_label_values(&[candidate.as_str()])
            .set(i64::from(candidate == current));
    }

    HYDRATIONS_IN_FLIGHT.set(engine.pending_hydrations() as i64);
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let hash_regex = regex_lite::Regex::new(r"[0-9a-fA-F]{40}").unwrap();
    let numeric_regex = regex_lite::Regex::new(r"/\d+(/|$)").unwrap();

    let result = hash_regex.replace_all(path, "{hash}");
    let result = numeric_regex.replace_all(&result, "/{index}$1");
    result.to_string()
}
