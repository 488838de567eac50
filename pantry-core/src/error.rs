//! Error types for PANTRY operations

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
///
/// These are fatal: they surface at startup and are never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Input validation errors for inbound lookups.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Unsupported store: {store}")]
    UnsupportedStore { store: String },
}

/// Cache backend errors.
///
/// These never leave the cache guard; they only feed the circuit breaker.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Cache payload for key {key} could not be decoded: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Category of a terminal upstream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The upstream kept answering 429 after the extra attempt.
    RateLimited,
    /// Every attempt ran past its deadline.
    Timeout,
    /// Connection, DNS or transport level failure.
    Network,
    /// The upstream answered with a non-success status.
    Status,
    /// The upstream body could not be decoded.
    InvalidResponse,
    /// The request never left the process (bad store, empty query).
    InvalidInput,
    /// Credentials or endpoints are missing.
    Configuration,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Status => "status",
            Self::InvalidResponse => "invalid_response",
            Self::InvalidInput => "invalid_input",
            Self::Configuration => "configuration",
        }
    }

    /// Default HTTP status surfaced for this failure category.
    pub fn default_status(&self) -> u16 {
        match self {
            Self::RateLimited => 429,
            Self::Timeout => 504,
            Self::Network | Self::InvalidResponse | Self::Status => 502,
            Self::InvalidInput => 400,
            Self::Configuration => 500,
        }
    }
}

/// Structured failure returned by the fetch layer.
///
/// The fetch layer never panics or propagates a raw transport error; every
/// failure is normalized into this shape so it can be rendered as
/// `{message, status}` at the HTTP boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[error("{message} (status {status}, {attempts} attempt(s))")]
pub struct UpstreamFailure {
    pub kind: FailureKind,
    pub message: String,
    pub status: u16,
    pub attempts: u32,
}

impl UpstreamFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>, attempts: u32) -> Self {
        Self {
            kind,
            message: message.into(),
            status: kind.default_status(),
            attempts,
        }
    }

    /// Failure carrying the upstream's own status code.
    pub fn from_status(status: u16, message: impl Into<String>, attempts: u32) -> Self {
        Self {
            kind: if status == 429 {
                FailureKind::RateLimited
            } else {
                FailureKind::Status
            },
            message: message.into(),
            status,
            attempts,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidInput, message, 0)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Configuration, message, 0)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == FailureKind::RateLimited
    }

    /// The upstream itself is down or unreachable, as opposed to rejecting
    /// this particular query. Another query to the same host will fail the
    /// same way.
    pub fn is_outage(&self) -> bool {
        match self.kind {
            FailureKind::Timeout | FailureKind::Network => true,
            FailureKind::Status => self.status >= 500,
            _ => false,
        }
    }
}

impl From<ValidationError> for UpstreamFailure {
    fn from(err: ValidationError) -> Self {
        Self::invalid_input(err.to_string())
    }
}

/// Master error type for all PANTRY errors.
#[derive(Debug, Clone, Error)]
pub enum PantryError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamFailure),
}

/// Result type alias for PANTRY operations.
pub type PantryResult<T> = Result<T, PantryError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "fresh_window".to_string(),
            value: "48h".to_string(),
            reason: "must be shorter than hard_ttl".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("fresh_window"));
        assert!(msg.contains("48h"));
        assert!(msg.contains("must be shorter than hard_ttl"));
    }

    #[test]
    fn test_cache_error_display_corrupt() {
        let err = CacheError::Corrupt {
            key: "coles:garlic:1".to_string(),
            reason: "expected value".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("coles:garlic:1"));
        assert!(msg.contains("could not be decoded"));
    }

    #[test]
    fn test_failure_kind_status_mapping() {
        assert_eq!(FailureKind::RateLimited.default_status(), 429);
        assert_eq!(FailureKind::Timeout.default_status(), 504);
        assert_eq!(FailureKind::Network.default_status(), 502);
        assert_eq!(FailureKind::InvalidInput.default_status(), 400);
        assert_eq!(FailureKind::Configuration.default_status(), 500);
    }

    #[test]
    fn test_upstream_failure_from_status_keeps_code() {
        let failure = UpstreamFailure::from_status(404, "not found", 1);
        assert_eq!(failure.kind, FailureKind::Status);
        assert_eq!(failure.status, 404);

        let limited = UpstreamFailure::from_status(429, "slow down", 2);
        assert!(limited.is_rate_limited());
        assert_eq!(limited.attempts, 2);
    }

    #[test]
    fn test_outage_classification() {
        assert!(UpstreamFailure::new(FailureKind::Timeout, "slow", 3).is_outage());
        assert!(UpstreamFailure::new(FailureKind::Network, "refused", 3).is_outage());
        assert!(UpstreamFailure::from_status(503, "unavailable", 3).is_outage());
        assert!(!UpstreamFailure::from_status(404, "not found", 1).is_outage());
        assert!(!UpstreamFailure::from_status(429, "slow down", 2).is_outage());
        assert!(!UpstreamFailure::new(FailureKind::InvalidResponse, "bad json", 1).is_outage());
    }

    #[test]
    fn test_upstream_failure_serializes_message_and_status() -> Result<(), serde_json::Error> {
        let failure = UpstreamFailure::new(FailureKind::Timeout, "upstream timed out", 3);
        let json = serde_json::to_value(&failure)?;
        assert_eq!(json["message"], "upstream timed out");
        assert_eq!(json["status"], 504);
        assert_eq!(json["kind"], "timeout");
        Ok(())
    }

    #[test]
    fn test_validation_error_into_failure() {
        let failure: UpstreamFailure = ValidationError::UnsupportedStore {
            store: "aldi".to_string(),
        }
        .into();
        assert_eq!(failure.kind, FailureKind::InvalidInput);
        assert_eq!(failure.status, 400);
        assert!(failure.message.contains("aldi"));
    }

    #[test]
    fn test_pantry_error_from_variants() {
        let config = PantryError::from(ConfigError::MissingRequired {
            field: "api_key".to_string(),
        });
        assert!(matches!(config, PantryError::Config(_)));

        let validation = PantryError::from(ValidationError::RequiredFieldMissing {
            field: "query".to_string(),
        });
        assert!(matches!(validation, PantryError::Validation(_)));

        let cache = PantryError::from(CacheError::LockPoisoned);
        assert!(matches!(cache, PantryError::Cache(_)));

        let upstream = PantryError::from(UpstreamFailure::invalid_input("empty query"));
        assert!(matches!(upstream, PantryError::Upstream(_)));
    }
}
