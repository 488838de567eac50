//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use crate::services::ProductResolver;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// The resolver owns the breaker, token buckets and in-flight set; every
    /// request shares this one instance.
    pub resolver: Arc<ProductResolver>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(resolver: ProductResolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
            start_time: Instant::now(),
        }
    }
}
