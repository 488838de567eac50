//! Circuit-breaker guarded cache access.
//!
//! Every call is bounded by the configured timeout. Errors and timeouts feed
//! the breaker and are never returned: a failed `get` is a miss and a failed
//! `set` is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use pantry_core::{CacheGuardConfig, CircuitState, HealthCheck};

use super::breaker::CircuitBreaker;
use super::traits::CacheBackend;
use crate::background::spawn_detached;

/// Fast-fail wrapper around a [`CacheBackend`].
#[derive(Clone)]
pub struct CacheGuard {
    backend: Arc<dyn CacheBackend>,
    breaker: Arc<CircuitBreaker>,
    timeout: Duration,
}

impl CacheGuard {
    pub fn new(backend: Arc<dyn CacheBackend>, config: &CacheGuardConfig) -> Self {
        Self {
            backend,
            breaker: Arc::new(CircuitBreaker::from_config(config)),
            timeout: config.timeout,
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    /// Cached value, or `None` on miss, skip, error or timeout.
    pub async fn get(&self, key: &str) -> Option<String> {
        if !self.breaker.allow() {
            debug!(key = %key, "Cache circuit open, skipping read");
            return None;
        }

        match timeout(self.timeout, self.backend.get(key)).await {
            Ok(Ok(value)) => {
                self.breaker.record_success();
                value
            }
            Ok(Err(e)) => {
                warn!(key = %key, backend = self.backend.name(), error = %e, "Cache read failed");
                self.breaker.record_failure();
                None
            }
            Err(_) => {
                warn!(
                    key = %key,
                    backend = self.backend.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Cache read timed out"
                );
                self.breaker.record_failure();
                None
            }
        }
    }

    /// Fire-and-forget write. Returns immediately; the handle is `None` when
    /// the breaker refused the write.
    pub fn set(&self, key: String, value: String, ttl: Duration) -> Option<JoinHandle<()>> {
        if !self.breaker.allow() {
            debug!(key = %key, "Cache circuit open, skipping write");
            return None;
        }

        let backend = Arc::clone(&self.backend);
        let breaker = Arc::clone(&self.breaker);
        let limit = self.timeout;
        Some(spawn_detached("cache_write", async move {
            match timeout(limit, backend.set(&key, value, ttl)).await {
                Ok(Ok(())) => breaker.record_success(),
                Ok(Err(e)) => {
                    warn!(key = %key, error = %e, "Cache write failed");
                    breaker.record_failure();
                }
                Err(_) => {
                    warn!(key = %key, "Cache write timed out");
                    breaker.record_failure();
                }
            }
            Ok(())
        }))
    }

    /// Health of the cache as seen through the breaker.
    pub fn health(&self) -> HealthCheck {
        let state = self.breaker.state();
        let check = match state {
            CircuitState::Closed => HealthCheck::healthy("cache"),
            CircuitState::HalfOpen => HealthCheck::degraded("cache", "circuit half-open, probing"),
            CircuitState::Open => HealthCheck::degraded("cache", "circuit open, cache bypassed"),
        };
        check
            .with_metadata("backend", self.backend.name().into())
            .with_metadata("circuit", state.as_str().into())
            .with_metadata(
                "consecutive_failures",
                self.breaker.consecutive_failures().into(),
            )
    }
}

impl std::fmt::Debug for CacheGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheGuard")
            .field("backend", &self.backend.name())
            .field("breaker", &self.breaker)
            .field("timeout", &self.timeout)
            .finish()
    }
}
