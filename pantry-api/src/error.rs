//! Error Types for PANTRY API
//!
//! This module defines error handling for the HTTP layer:
//! - ErrorCode enum for categorizing errors
//! - ApiError carrying a code, a safe message and the HTTP status
//! - IntoResponse rendering every error as `{message, status}`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pantry_core::{ConfigError, FailureKind, PantryError, UpstreamFailure, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    /// Store is not one of the supported stores
    UnsupportedStore,

    // ========================================================================
    // Upstream Errors (status passed through or 502/504/429)
    // ========================================================================
    /// Upstream answered with an error status or an unreadable body
    UpstreamError,

    /// Every upstream attempt ran past its deadline
    UpstreamTimeout,

    /// Upstream kept rate limiting after the extra attempt
    TooManyRequests,

    // ========================================================================
    // Server Errors (500)
    // ========================================================================
    /// Required configuration is missing or invalid
    ConfigurationError,

    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Default HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput | ErrorCode::MissingField | ErrorCode::UnsupportedStore => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::UpstreamError => StatusCode::BAD_GATEWAY,
            ErrorCode::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::ConfigurationError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "Invalid input",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::UnsupportedStore => "Unsupported store",
            ErrorCode::UpstreamError => "Upstream product search failed",
            ErrorCode::UpstreamTimeout => "Upstream product search timed out",
            ErrorCode::TooManyRequests => "Upstream rate limit exceeded",
            ErrorCode::ConfigurationError => "Server is misconfigured",
            ErrorCode::InternalError => "An internal error occurred",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR
// ============================================================================

/// Wire shape of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub message: String,
    pub status: u16,
}

/// Structured API error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    status: StatusCode,
}

impl ApiError {
    /// Create a new API error with the code's default status.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: code.status_code(),
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    /// Override the HTTP status, e.g. to pass an upstream status through.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            message: self.message.clone(),
            status: self.status.as_u16(),
        }
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field missing: {}", field),
        )
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationError, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = %self.code, status = status.as_u16(), message = %self.message, "Request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM DOMAIN ERRORS
// ============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let code = match &err {
            ValidationError::RequiredFieldMissing { .. } => ErrorCode::MissingField,
            ValidationError::UnsupportedStore { .. } => ErrorCode::UnsupportedStore,
            ValidationError::InvalidValue { .. } => ErrorCode::InvalidInput,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<UpstreamFailure> for ApiError {
    fn from(failure: UpstreamFailure) -> Self {
        let code = match failure.kind {
            FailureKind::RateLimited => ErrorCode::TooManyRequests,
            FailureKind::Timeout => ErrorCode::UpstreamTimeout,
            FailureKind::InvalidInput => ErrorCode::InvalidInput,
            FailureKind::Configuration => {
                tracing::error!(error = %failure, "Upstream misconfigured");
                return ApiError::from_code(ErrorCode::ConfigurationError);
            }
            FailureKind::Network | FailureKind::Status | FailureKind::InvalidResponse => {
                ErrorCode::UpstreamError
            }
        };
        let status = StatusCode::from_u16(failure.status).unwrap_or(code.status_code());
        ApiError::new(code, failure.message).with_status(status)
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::configuration(err.to_string())
    }
}

impl From<PantryError> for ApiError {
    fn from(err: PantryError) -> Self {
        match err {
            PantryError::Validation(e) => e.into(),
            PantryError::Upstream(e) => e.into(),
            PantryError::Config(e) => e.into(),
            PantryError::Cache(e) => {
                // cache errors are absorbed by the guard; reaching here is a bug
                tracing::error!(error = %e, "Cache error escaped the cache guard");
                ApiError::from_code(ErrorCode::InternalError)
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_input(format!("JSON error: {}", err))
    }
}

// ============================================================================
// TESTS
// ============================================================================
