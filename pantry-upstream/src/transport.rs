//! Raw upstream transport
//!
//! One call, one HTTP request. Retries, timeouts and rate limiting live in
//! [`crate::fetcher`].

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::debug;

use pantry_core::{ConfigError, PantryResult, SearchPage, SearchRequest, UpstreamConfig};

/// Longest slice of an error body kept in messages.
const MAX_ERROR_BODY: usize = 200;

/// Failure of a single transport call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("upstream call timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("invalid upstream response: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { status: 429, .. })
    }

    /// Timeouts, connection failures and gateway errors are worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Connect(_) => true,
            Self::Status { status, .. } => matches!(status, 500 | 502 | 503 | 504),
            Self::Decode(_) => false,
        }
    }
}

/// Issues one product-search request.
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage, TransportError>;
}

/// `reqwest` transport for the RapidAPI-hosted store search endpoints.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    api_key: SecretString,
    config: UpstreamConfig,
}

impl HttpTransport {
    /// Build the transport. A missing API key is a configuration error.
    pub fn new(config: &UpstreamConfig) -> PantryResult<Self> {
        let api_key = config.require_api_key()?.clone();
        let client = Client::builder()
            .user_agent(concat!("pantry/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "upstream.client".to_string(),
                value: String::new(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key,
            config: config.clone(),
        })
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}

#[async_trait]
impl UpstreamTransport for HttpTransport {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage, TransportError> {
        let endpoint = self.config.endpoint(request.store);
        debug!(
            store = %request.store,
            query = %request.query,
            page = request.page,
            "Upstream search"
        );

        let response = self
            .client
            .get(endpoint.url())
            .query(&[
                ("query", request.query.clone()),
                ("page", request.page.to_string()),
                ("page_size", request.page_size.to_string()),
            ])
            .header("x-rapidapi-key", self.api_key.expose_secret())
            .header("x-rapidapi-host", endpoint.host_header())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Connect(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Decode(format!("failed to read body: {}", e)))?;

        if !status.is_success() {
            return Err(TransportError::status(status.as_u16(), truncate(&body)));
        }

        serde_json::from_str::<SearchPage>(&body)
            .map_err(|e| TransportError::Decode(format!("failed to parse search page: {}", e)))
    }
}
