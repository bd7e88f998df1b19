//! Common test utilities for integration tests.
//!
//! This module provides SSE body builders, a wiremock responder for event
//! streams, and client constructors tuned for fast reconnect tests.
//!
//! # Example
//!
//! ```ignore
//! use common::{sse_body, sse_response};
//!
//! let body = sse_body(&[(Some("1"), Some("hello"), "{}")]);
//! Mock::given(method("GET")).respond_with(sse_response(&body));
//! ```

#![allow(dead_code)]

pub mod mocks;

pub use mocks::*;

use std::sync::Arc;
use std::time::Duration;

use sse_resume::config::{ReconnectConfig, StreamConfig};
use sse_resume::StreamClient;
use wiremock::ResponseTemplate;

/// Render frames as an SSE body. Each frame is `(id, event, data)`; multi-line
/// data becomes several `data:` lines.
pub fn sse_body(frames: &[(Option<&str>, Option<&str>, &str)]) -> String {
    let mut body = String::new();
    for (id, event, data) in frames {
        if let Some(id) = id {
            body.push_str(&format!("id: {}\n", id));
        }
        if let Some(event) = event {
            body.push_str(&format!("event: {}\n", event));
        }
        for line in data.split('\n') {
            body.push_str(&format!("data: {}\n", line));
        }
        body.push('\n');
    }
    body
}

/// The four-event sequence a stream server sends for a fresh stream, ids 0 to 3.
pub fn standard_sequence() -> String {
    sse_body(&[
        (Some("0"), Some("hello"), r#"{"ts":"2024-01-01T00:00:00Z"}"#),
        (Some("1"), Some("token"), r#"{"text":"draft","index":0}"#),
        (Some("2"), Some("cost"), r#"{"tokens":5,"currency":"USD","amount":0.0}"#),
        (Some("3"), Some("done"), r#"{"reason":"complete"}"#),
    ])
}

/// A 200 `text/event-stream` response carrying `body`.
pub fn sse_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Cache-Control", "no-cache")
        .set_body_raw(body.as_bytes().to_vec(), "text/event-stream")
}

/// Reconnect settings that keep tests fast.
pub fn fast_reconnect() -> ReconnectConfig {
    ReconnectConfig::default()
        .with_initial_delay(Duration::from_millis(5))
        .with_max_delay(Duration::from_millis(20))
        .with_max_retries(Some(3))
}

/// A reqwest-backed client pointed at `base_url`.
pub fn client_for(base_url: &str) -> StreamClient {
    let config = StreamConfig::default()
        .with_base_url(base_url)
        .with_connect_timeout(Duration::from_secs(2))
        .with_reconnect(fast_reconnect());
    StreamClient::from_config(config).expect("Failed to build client")
}

/// A client backed by the scripted mock transport.
pub fn mock_client(mock: &MockHttpClient) -> StreamClient {
    let config = StreamConfig::default()
        .with_base_url(MOCK_BASE)
        .with_reconnect(fast_reconnect());
    StreamClient::with_http_client(config, Arc::new(mock.clone()))
}
