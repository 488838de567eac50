//! Prometheus Metrics Definitions
//!
//! Defines all PANTRY metrics with their labels and exposes the /metrics
//! endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use pantry_core::{CircuitState, Store};
use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s, 30s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Upstream fetch latency buckets (seconds); retries push the tail out.
const UPSTREAM_LATENCY_BUCKETS: &[f64] = &[0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 20.0];

/// Global metrics instance - initialized once on first use
pub static METRICS: Lazy<ApiResult<PantryMetrics>> = Lazy::new(PantryMetrics::new);

/// The registered metrics, or `None` if registration failed.
pub fn metrics() -> Option<&'static PantryMetrics> {
    METRICS.as_ref().ok()
}

/// Container for all PANTRY metrics.
#[derive(Clone)]
pub struct PantryMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Cache lookup outcomes - labels: store, source (fresh/stale/expired/miss)
    pub cache_lookups_total: CounterVec,

    /// Upstream fetch outcomes - labels: store, outcome (success or failure kind)
    pub upstream_fetches_total: CounterVec,

    /// Upstream fetch duration, including retries - labels: store
    pub upstream_fetch_duration_seconds: HistogramVec,

    /// Ingredient resolution outcomes - labels: store, outcome
    pub match_outcomes_total: CounterVec,

    /// Cache circuit state (0 closed, 1 open, 2 half-open)
    pub cache_circuit_state: Gauge,
}

impl PantryMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "pantry_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "pantry_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            cache_lookups_total: register_counter_vec!(
                "pantry_cache_lookups_total",
                "Product search lookups by cache outcome",
                &["store", "source"]
            )
            .map_err(|e| registration_error("cache_lookups_total", e))?,

            upstream_fetches_total: register_counter_vec!(
                "pantry_upstream_fetches_total",
                "Upstream product searches by outcome",
                &["store", "outcome"]
            )
            .map_err(|e| registration_error("upstream_fetches_total", e))?,

            upstream_fetch_duration_seconds: register_histogram_vec!(
                "pantry_upstream_fetch_duration_seconds",
                "Duration of uncached product searches in seconds",
                &["store"],
                UPSTREAM_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("upstream_fetch_duration_seconds", e))?,

            match_outcomes_total: register_counter_vec!(
                "pantry_match_outcomes_total",
                "Ingredient resolutions by outcome",
                &["store", "outcome"]
            )
            .map_err(|e| registration_error("match_outcomes_total", e))?,

            cache_circuit_state: register_gauge!(
                "pantry_cache_circuit_state",
                "Cache circuit breaker state (0 closed, 1 open, 2 half-open)"
            )
            .map_err(|e| registration_error("cache_circuit_state", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    pub fn record_cache_lookup(&self, store: Store, source: &str) {
        self.cache_lookups_total
            .with_label_values(&[store.as_str(), source])
            .inc();
    }

    /// Record an uncached search; `outcome` is "success" or a failure kind.
    pub fn record_upstream_fetch(&self, store: Store, outcome: &str, duration_secs: f64) {
        self.upstream_fetches_total
            .with_label_values(&[store.as_str(), outcome])
            .inc();
        self.upstream_fetch_duration_seconds
            .with_label_values(&[store.as_str()])
            .observe(duration_secs);
    }

    pub fn record_match_outcome(&self, store: Store, outcome: &str) {
        self.match_outcomes_total
            .with_label_values(&[store.as_str(), outcome])
            .inc();
    }

    pub fn set_circuit_state(&self, state: CircuitState) {
        self.cache_circuit_state.set(state.as_gauge());
    }
}

fn registration_error(name: &str, err: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, err))
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    // registers on first scrape
    if let Err(e) = METRICS.as_ref() {
        tracing::error!(error = %e, "Metrics registration failed");
    }

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    fn registered() -> Result<&'static PantryMetrics, String> {
        METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))
    }

    #[test]
    fn test_metrics_creation() -> Result<(), String> {
        let metrics = registered()?;
        assert!(!metrics.http_requests_total.desc().is_empty());
        Ok(())
    }

    #[test]
    fn test_record_cache_and_match_outcomes() -> Result<(), String> {
        let metrics = registered()?;
        let before = metrics
            .cache_lookups_total
            .with_label_values(&["coles", "stale"])
            .get();
        metrics.record_cache_lookup(Store::Coles, "stale");
        let after = metrics
            .cache_lookups_total
            .with_label_values(&["coles", "stale"])
            .get();
        assert!(after >= before + 1.0);

        metrics.record_match_outcome(Store::Woolworths, "resolved");
        metrics.record_upstream_fetch(Store::Woolworths, "success", 0.2);
        Ok(())
    }

    #[test]
    fn test_circuit_gauge_is_gathered() -> Result<(), String> {
        let metrics = registered()?;
        metrics.set_circuit_state(CircuitState::Closed);
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .map_err(|e| e.to_string())?;
        let text = String::from_utf8(buffer).map_err(|e| e.to_string())?;
        assert!(text.contains("pantry_cache_circuit_state"));
        Ok(())
    }
}
