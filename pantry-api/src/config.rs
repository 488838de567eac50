//! API Configuration Module
//!
//! Server binding, CORS and cache backend selection. Resolver tuning lives
//! in [`pantry_core::ResolverConfig`].

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;

use crate::constants::{
    DEFAULT_BIND_HOST, DEFAULT_CONCURRENCY_LIMIT, DEFAULT_CORS_MAX_AGE_SECS, DEFAULT_PORT,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::error::{ApiError, ApiResult};

/// Which cache backend the resolver talks to.
#[derive(Debug, Clone)]
pub enum CacheBackendConfig {
    /// Process-local map; nothing is shared between instances.
    InMemory,
    /// REST key-value service.
    RestKv { url: String, token: SecretString },
}

/// API configuration for binding, CORS and the cache backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_host: String,
    pub port: u16,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    pub request_timeout: Duration,
    pub concurrency_limit: usize,

    /// Serve Prometheus metrics at /metrics.
    pub metrics_enabled: bool,

    pub cache_backend: CacheBackendConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: DEFAULT_BIND_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_origins: Vec::new(),
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            metrics_enabled: true,
            cache_backend: CacheBackendConfig::InMemory,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PANTRY_API_BIND`: Bind host (default: 0.0.0.0)
    /// - `PORT` or `PANTRY_API_PORT`: Listen port (default: 3000)
    /// - `PANTRY_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `PANTRY_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `PANTRY_REQUEST_TIMEOUT_SECS`: Per-request deadline (default: 90)
    /// - `PANTRY_CONCURRENCY_LIMIT`: In-flight request cap (default: 256)
    /// - `PANTRY_METRICS_ENABLED`: "true" or "false" (default: true)
    /// - `PANTRY_CACHE_URL` / `PANTRY_CACHE_TOKEN`: REST KV cache; in-memory when unset
    pub fn from_env() -> ApiResult<Self> {
        let defaults = Self::default();

        let port = match std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("PANTRY_API_PORT").ok())
        {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", raw)))?,
            None => defaults.port,
        };

        let cors_origins = std::env::var("PANTRY_CORS_ORIGINS")
            .ok()
            .map(|s| parse_origins(&s))
            .unwrap_or_default();

        let cache_url = std::env::var("PANTRY_CACHE_URL")
            .ok()
            .filter(|u| !u.trim().is_empty());
        let cache_token = std::env::var("PANTRY_CACHE_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        let cache_backend = match (cache_url, cache_token) {
            (Some(url), Some(token)) => CacheBackendConfig::RestKv {
                url,
                token: SecretString::new(token.into()),
            },
            (None, None) => CacheBackendConfig::InMemory,
            (Some(_), None) => {
                return Err(ApiError::configuration(
                    "PANTRY_CACHE_URL is set but PANTRY_CACHE_TOKEN is missing",
                ))
            }
            (None, Some(_)) => {
                return Err(ApiError::configuration(
                    "PANTRY_CACHE_TOKEN is set but PANTRY_CACHE_URL is missing",
                ))
            }
        };

        Ok(Self {
            bind_host: std::env::var("PANTRY_API_BIND").unwrap_or(defaults.bind_host),
            port,
            cors_origins,
            cors_max_age_secs: env_parse("PANTRY_CORS_MAX_AGE_SECS", defaults.cors_max_age_secs),
            request_timeout: Duration::from_secs(env_parse(
                "PANTRY_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            concurrency_limit: env_parse("PANTRY_CONCURRENCY_LIMIT", defaults.concurrency_limit),
            metrics_enabled: std::env::var("PANTRY_METRICS_ENABLED")
                .map(|s| s.to_lowercase() != "false" && s != "0")
                .unwrap_or(true),
            cache_backend,
        })
    }

    /// Socket address to listen on.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_dev_mode() {
        let config = ApiConfig::default();
        assert!(!config.is_production());
        assert!(matches!(config.cache_backend, CacheBackendConfig::InMemory));
        assert_eq!(
            config.bind_addr().map(|a| a.port()).ok(),
            Some(DEFAULT_PORT)
        );
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" https://pantry.run, ,https://app.pantry.run"),
            vec!["https://pantry.run", "https://app.pantry.run"]
        );
    }

    #[test]
    fn test_bad_bind_host_rejected() {
        let config = ApiConfig {
            bind_host: "not a host".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.bind_addr().is_err());
    }

    #[test]
    fn test_cache_token_is_redacted() {
        let backend = CacheBackendConfig::RestKv {
            url: "https://kv.example".to_string(),
            token: SecretString::new("secret-token".into()),
        };
        let rendered = format!("{:?}", backend);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("kv.example"));
    }
}
