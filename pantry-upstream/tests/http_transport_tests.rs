//! HttpTransport against a local stand-in for the store search API.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use pantry_core::{
    FailureKind, SearchRequest, SourceFetcher, Store, StoreEndpoint, UpstreamConfig,
};
use pantry_upstream::{HttpTransport, ResilientFetcher, TransportError, UpstreamTransport};
use secrecy::SecretString;
use serde_json::json;

async fn search(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if headers.get("x-rapidapi-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
        return (StatusCode::FORBIDDEN, Json(json!({ "message": "bad key" })));
    }
    match params.get("query").map(String::as_str) {
        Some("coles teapot") => (StatusCode::IM_A_TEAPOT, Json(json!({}))),
        Some("coles garbage") => (StatusCode::OK, Json(json!(["not", "a", "page"]))),
        Some(query) => (
            StatusCode::OK,
            Json(json!({
                "results": [{
                    "product_name": format!("Result for {}", query),
                    "current_price": "$3.50",
                    "product_size": "500g",
                    "url": "https://example.test/p/1"
                }],
                "total_pages": 4,
                "current_page": params.get("page").and_then(|p| p.parse::<u32>().ok()).unwrap_or(0)
            })),
        ),
        None => (StatusCode::BAD_REQUEST, Json(json!({}))),
    }
}

async fn spawn_server() -> SocketAddr {
    let app = Router::new().route("/coles/product-search/", get(search));
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => listener,
        Err(e) => panic!("bind failed: {}", e),
    };
    let addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(e) => panic!("no local addr: {}", e),
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

fn config(addr: SocketAddr, key: &str) -> UpstreamConfig {
    let mut config = UpstreamConfig {
        api_key: Some(SecretString::new(key.into())),
        ..UpstreamConfig::default()
    };
    config.endpoint_overrides.insert(
        Store::Coles,
        StoreEndpoint {
            host: format!("http://{}", addr),
            path: "/coles/product-search/".to_string(),
        },
    );
    config
}

fn request(query: &str) -> SearchRequest {
    match SearchRequest::new(Store::Coles, query, 2, 20) {
        Ok(request) => request,
        Err(e) => panic!("invalid request: {}", e),
    }
}

fn transport(config: &UpstreamConfig) -> HttpTransport {
    match HttpTransport::new(config) {
        Ok(transport) => transport,
        Err(e) => panic!("transport: {}", e),
    }
}

#[tokio::test]
async fn decodes_search_page_with_store_field_names() {
    let addr = spawn_server().await;
    let transport = transport(&config(addr, "test-key"));

    let page = transport.search(&request("coles garlic")).await;
    let page = match page {
        Ok(page) => page,
        Err(e) => panic!("search failed: {}", e),
    };
    assert_eq!(page.current_page, 2);
    assert_eq!(page.total_pages, 4);
    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].name, "Result for coles garlic");
    assert_eq!(page.results[0].price, Some(3.5));
    assert_eq!(page.results[0].size_string.as_deref(), Some("500g"));
}

#[tokio::test]
async fn error_status_is_reported() {
    let addr = spawn_server().await;
    let transport = transport(&config(addr, "wrong-key"));
    let err = transport.search(&request("coles garlic")).await.err();
    assert!(matches!(err, Some(TransportError::Status { status: 403, .. })));
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let addr = spawn_server().await;
    let transport = transport(&config(addr, "test-key"));
    let err = transport.search(&request("coles garbage")).await.err();
    assert!(matches!(err, Some(TransportError::Decode(_))));
}

#[tokio::test]
async fn fetcher_passes_terminal_status_through() {
    let addr = spawn_server().await;
    let config = config(addr, "test-key");
    let fetcher = ResilientFetcher::new(
        Arc::new(transport(&config)),
        Arc::new(pantry_upstream::RateLimiter::new(Default::default())),
        config,
    );
    let failure = fetcher.fetch(&request("coles teapot")).await.err();
    let failure = failure.unwrap_or_else(|| panic!("expected failure"));
    assert_eq!(failure.status, 418);
    assert_eq!(failure.kind, FailureKind::Status);
    assert_eq!(failure.attempts, 1);
}
