//! Prometheus metrics for the Reserva gateway.
//!
//! This module provides:
//! - Response cache metrics (hit/miss rates)
//! - Rate limiter metrics (allowed/rejected requests)
//! - Backend call metrics (outcomes, retries)

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metric names as constants for consistency.
pub mod names {
    // Cache metrics
    pub const CACHE_HITS_TOTAL: &str = "gateway_cache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "gateway_cache_misses_total";
    pub const CACHE_SWEEP_REMOVED_TOTAL: &str = "gateway_cache_sweep_removed_total";

    // Rate limiter metrics
    pub const RATE_LIMIT_ALLOWED_TOTAL: &str = "gateway_rate_limit_allowed_total";
    pub const RATE_LIMIT_REJECTED_TOTAL: &str = "gateway_rate_limit_rejected_total";

    // Backend metrics
    pub const BACKEND_CALLS_TOTAL: &str = "gateway_backend_calls_total";
}

/// Initialize the Prometheus metrics exporter.
///
/// This should be called once at server startup.
/// Returns `true` if initialization succeeded, `false` if already initialized.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        tracing::debug!("Prometheus metrics already initialized");
        return false;
    }

    // Pull-based metrics: we serve /metrics ourselves
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            if PROMETHEUS_HANDLE.set(handle).is_err() {
                tracing::warn!("Failed to store Prometheus handle (already set)");
                return false;
            }
            tracing::info!("Prometheus metrics initialized");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Prometheus recorder");
            false
        }
    }
}

/// Render all metrics in Prometheus text format.
///
/// Returns `None` if metrics were not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|handle| handle.render())
}

/// Record a response cache hit.
pub fn record_cache_hit(group: &str) {
    counter!(names::CACHE_HITS_TOTAL, "group" => group.to_string()).increment(1);
}

/// Record a response cache miss.
pub fn record_cache_miss(group: &str) {
    counter!(names::CACHE_MISSES_TOTAL, "group" => group.to_string()).increment(1);
}

/// Record entries removed by the background sweep.
pub fn record_sweep_removed(count: u64) {
    counter!(names::CACHE_SWEEP_REMOVED_TOTAL).increment(count);
}

/// Record a request admitted by the rate limiter.
pub fn record_rate_limit_allowed() {
    counter!(names::RATE_LIMIT_ALLOWED_TOTAL).increment(1);
}

/// Record a request rejected by the rate limiter.
pub fn record_rate_limit_rejected(scope: &str, action: &str) {
    counter!(
        names::RATE_LIMIT_REJECTED_TOTAL,
        "scope" => scope.to_string(),
        "action" => action.to_string()
    )
    .increment(1);
}

/// Record a backend call outcome ("ok" or the error code).
pub fn record_backend_call(service: &str, outcome: &str) {
    counter!(
        names::BACKEND_CALLS_TOTAL,
        "service" => service.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}
