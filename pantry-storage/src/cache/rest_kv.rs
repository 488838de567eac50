//! Network key-value backend over a REST protocol.
//!
//! Speaks the Upstash-style dialect:
//! - `GET {base}/get/{key}` returns `{"result": "<value>" | null}`
//! - `POST {base}/set/{key}?EX={secs}` with the value as the body
//!
//! Both carry a bearer token.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use pantry_core::{CacheError, PantryResult};

use super::traits::{CacheBackend, CacheStats};

#[derive(Debug, Deserialize)]
struct KvResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

fn unavailable(reason: impl Into<String>) -> CacheError {
    CacheError::Unavailable {
        reason: reason.into(),
    }
}

/// REST key-value cache client.
#[derive(Debug)]
pub struct RestKvBackend {
    client: Client,
    base_url: String,
    token: SecretString,
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
}

impl RestKvBackend {
    pub fn new(base_url: impl Into<String>, token: SecretString) -> PantryResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| unavailable(format!("failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        })
    }

    fn url(&self, op: &str, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, op, urlencoding::encode(key))
    }

    async fn parse(response: reqwest::Response, key: &str) -> PantryResult<KvResponse> {
        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("cache returned status {}", status.as_u16())).into());
        }
        let body: KvResponse = response.json().await.map_err(|e| CacheError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        if let Some(error) = body.error {
            return Err(unavailable(error).into());
        }
        Ok(body)
    }
}

#[async_trait]
impl CacheBackend for RestKvBackend {
    async fn get(&self, key: &str) -> PantryResult<Option<String>> {
        let response = self
            .client
            .get(self.url("get", key))
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let value = match Self::parse(response, key).await?.result {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        };

        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> PantryResult<()> {
        let response = self
            .client
            .post(self.url("set", key))
            .query(&[("EX", ttl.as_secs().max(1))])
            .bearer_auth(self.token.expose_secret())
            .body(value)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        Self::parse(response, key).await?;
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn stats(&self) -> PantryResult<CacheStats> {
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            entry_count: None,
        })
    }

    fn name(&self) -> &'static str {
        "rest_kv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> RestKvBackend {
        match RestKvBackend::new("https://kv.example.test/", SecretString::new("secret-token".into())) {
            Ok(b) => b,
            Err(e) => panic!("backend should build: {}", e),
        }
    }

    #[test]
    fn test_url_encodes_key_and_trims_base() {
        let kv = backend();
        assert_eq!(
            kv.url("get", "coles:garlic/bulb:1"),
            "https://kv.example.test/get/coles%3Agarlic%2Fbulb%3A1"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", backend());
        assert!(!rendered.contains("secret-token"));
    }

    #[test]
    fn test_kv_response_shapes() -> Result<(), serde_json::Error> {
        let hit: KvResponse = serde_json::from_str(r#"{"result":"{\"a\":1}"}"#)?;
        assert!(matches!(hit.result, Some(serde_json::Value::String(_))));
        let miss: KvResponse = serde_json::from_str(r#"{"result":null}"#)?;
        assert!(matches!(miss.result, None | Some(serde_json::Value::Null)));
        let err: KvResponse = serde_json::from_str(r#"{"error":"WRONGPASS"}"#)?;
        assert_eq!(err.error.as_deref(), Some("WRONGPASS"));
        Ok(())
    }
}
