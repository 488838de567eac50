//! PANTRY API - HTTP surface for the product resolver
//!
//! Exposes cached product search and ingredient resolution over axum, with
//! health probes, Prometheus metrics and a generated OpenAPI document.

pub mod config;
pub mod constants;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;

use std::sync::Arc;

use pantry_core::ResolverConfig;
use pantry_storage::{CacheBackend, InMemoryCacheBackend, RestKvBackend};

pub use config::{ApiConfig, CacheBackendConfig};
pub use error::{ApiError, ApiResult, ErrorBody, ErrorCode};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use services::{ProductResolver, Resolution};
pub use state::AppState;

/// Build the cache backend selected by the configuration.
pub fn build_cache_backend(config: &CacheBackendConfig) -> ApiResult<Arc<dyn CacheBackend>> {
    match config {
        CacheBackendConfig::InMemory => Ok(Arc::new(InMemoryCacheBackend::new())),
        CacheBackendConfig::RestKv { url, token } => {
            let backend = RestKvBackend::new(url.clone(), token.clone())?;
            Ok(Arc::new(backend))
        }
    }
}

/// Build the application state from configuration.
pub fn build_state(resolver_config: &ResolverConfig, api_config: &ApiConfig) -> ApiResult<AppState> {
    let backend = build_cache_backend(&api_config.cache_backend)?;
    let resolver = ProductResolver::from_config(resolver_config, backend)?;
    Ok(AppState::new(resolver))
}
