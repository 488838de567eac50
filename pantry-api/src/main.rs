//! PANTRY API Server Entry Point
//!
//! Bootstraps telemetry and configuration, builds the resolver and starts
//! the Axum HTTP server.

use axum::Router;
use pantry_api::telemetry::{init_tracer, TelemetryConfig};
use pantry_api::{build_state, create_api_router, ApiConfig, ApiError, ApiResult};
use pantry_core::ResolverConfig;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env()?;
    init_tracer(&telemetry_config)?;

    let api_config = ApiConfig::from_env()?;
    let resolver_config = ResolverConfig::from_env();
    tracing::debug!(config = ?resolver_config, cache_backend = ?api_config.cache_backend, "Loaded configuration");

    let state = build_state(&resolver_config, &api_config)?;
    let app: Router = create_api_router(state, &api_config);

    let addr = api_config.bind_addr()?;
    tracing::info!(%addr, "Starting PANTRY API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
