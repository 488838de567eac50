//! Route assembly
//!
//! - `/api/products` cached product search
//! - `/api/resolve` ingredient resolution
//! - `/health/*` probes
//! - `/metrics` Prometheus scrape (when enabled)
//! - `/openapi.json` generated document

pub mod health;
pub mod products;
pub mod resolve;

use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ApiConfig;
use crate::constants::CACHE_STATUS_HEADER;
use crate::openapi::openapi_json;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// In development mode (empty origins), allows all origins.
/// In production mode, only allows configured origins.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([HeaderName::from_static(CACHE_STATUS_HEADER)])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: Development mode - allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(
            "CORS: Production mode - allowing origins: {:?}",
            config.cors_origins
        );
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Create the complete API router.
///
/// Execution order: CORS -> Trace -> Observability -> Timeout -> Concurrency limit -> Handler
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    let mut router = Router::new()
        .nest("/api/products", products::create_router())
        .nest("/api/resolve", resolve::create_router())
        .nest("/health", health::create_router())
        .route("/openapi.json", get(openapi_json));

    if config.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router
        .with_state(state)
        .layer(ConcurrencyLimitLayer::new(config.concurrency_limit))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(from_fn(observability_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(config))
}
