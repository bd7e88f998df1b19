//! Mock implementations for test fixtures.
//!
//! This module re-exports the mock transport from `sse_resume::adapters::mock`
//! and provides a builder for scripting it.

pub use sse_resume::adapters::mock::{MockHttpClient, MockResponse, RecordedRequest};
pub use sse_resume::traits::{HttpError, Response};

use bytes::Bytes;

/// Origin used by mock-backed clients.
pub const MOCK_BASE: &str = "http://mock";

/// URL prefix of stream requests that carry a query string; never matches the cancel path.
pub const MOCK_STREAM: &str = "http://mock/stream?";

/// Configuration for setting up mock HTTP responses.
pub struct MockHttpConfig {
    client: MockHttpClient,
}

impl MockHttpConfig {
    /// Creates a new mock HTTP configuration.
    pub fn new() -> Self {
        Self {
            client: MockHttpClient::new(),
        }
    }

    /// Queue one stream connection delivering `chunks`, then ending.
    pub fn then_stream(self, chunks: &[&str]) -> Self {
        self.client
            .push_response(MOCK_STREAM, MockResponse::Stream(to_bytes(chunks)));
        self
    }

    /// Queue one stream connection delivering `chunks`, then failing.
    pub fn then_stream_error(self, chunks: &[&str], error: HttpError) -> Self {
        self.client.push_response(
            MOCK_STREAM,
            MockResponse::StreamThenError(to_bytes(chunks), error),
        );
        self
    }

    /// Queue one stream connection delivering `chunks`, then staying open.
    pub fn then_stream_hang(self, chunks: &[&str]) -> Self {
        self.client
            .push_response(MOCK_STREAM, MockResponse::StreamThenHang(to_bytes(chunks)));
        self
    }

    /// Queue one connection attempt failing before any response.
    pub fn then_refuse(self, error: HttpError) -> Self {
        self.client
            .push_response(MOCK_STREAM, MockResponse::Error(error));
        self
    }

    /// Configures a successful JSON response.
    pub fn with_json_response(self, url: &str, status: u16, json: &str) -> Self {
        self.client.set_response(
            url,
            MockResponse::Success(Response::new(status, Bytes::from(json.to_string()))),
        );
        self
    }

    /// Builds the configured MockHttpClient.
    pub fn build(self) -> MockHttpClient {
        self.client
    }
}

impl Default for MockHttpConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn to_bytes(chunks: &[&str]) -> Vec<Bytes> {
    chunks
        .iter()
        .map(|chunk| Bytes::from(chunk.to_string()))
        .collect()
}

/// Value of `Last-Event-ID` on each recorded stream request, in order.
pub fn resume_headers(client: &MockHttpClient) -> Vec<Option<String>> {
    client
        .get_requests()
        .iter()
        .filter(|request| request.method == "GET")
        .map(|request| request.header("Last-Event-ID").map(str::to_string))
        .collect()
}
