//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Live sessions (hydrations, expiries, removals)
//! - Swarm reconfiguration
//! - Preloading

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Sessions
// =============================================================================

/// Live sessions currently registered.
pub static LIVE_SESSIONS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("torrhub_live_sessions", "Number of live torrent sessions").unwrap()
});

/// Background hydrations by result.
pub static HYDRATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "torrhub_hydrations_total",
            "Total catalog-to-live hydrations",
        ),
        &["result"], // "ready", "failed", "timeout", "superseded", "revoked"
    )
    .unwrap()
});

/// Time from hydration start to known metadata.
pub static HYDRATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "torrhub_hydration_duration_seconds",
            "Duration of catalog-to-live hydrations",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["result"],
    )
    .unwrap()
});

/// Sessions torn down by the idle sweeper.
pub static SESSIONS_EXPIRED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "torrhub_sessions_expired_total",
        "Total live sessions torn down after their grace period",
    )
    .unwrap()
});

/// Removals by kind.
pub static REMOVALS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("torrhub_removals_total", "Total torrent removals"),
        &["kind"], // "remove", "detach"
    )
    .unwrap()
});

// =============================================================================
// Reconfiguration
// =============================================================================

/// Settings reconfigurations by result.
pub static RECONFIGURATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "torrhub_reconfigurations_total",
            "Total swarm reconfigurations",
        ),
        &["result"], // "applied", "read_only", "failed"
    )
    .unwrap()
});

// =============================================================================
// Preload
// =============================================================================

/// Bytes read ahead by preload requests.
pub static PRELOAD_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("torrhub_preload_bytes_total", "Total bytes read ahead").unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Sessions
        Box::new(LIVE_SESSIONS.clone()),
        Box::new(HYDRATIONS.clone()),
        Box::new(HYDRATION_DURATION.clone()),
        Box::new(SESSIONS_EXPIRED.clone()),
        Box::new(REMOVALS.clone()),
        // Reconfiguration
        Box::new(RECONFIGURATIONS.clone()),
        // Preload
        Box::new(PRELOAD_BYTES.clone()),
    ]
}
