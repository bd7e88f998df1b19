//! Mock HTTP client for testing.
//!
//! Responses are scripted per URL. Streaming responses are delivered as the
//! exact chunk sequence given, which lets tests choose chunk boundaries, end
//! a body early, fail mid-stream, or keep a stream open indefinitely.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::traits::{ByteStream, Headers, HttpClient, HttpError, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method (GET or POST)
    pub method: String,
    /// Request URL, including the query string
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body (for POST requests)
    pub body: Option<String>,
}

impl RecordedRequest {
    /// Look up a header ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a buffered response; on a streaming request a non-200 status is
    /// reported as [`HttpError::ServerError`]
    Success(Response),
    /// Fail before any response
    Error(HttpError),
    /// Deliver these chunks, then end the body
    Stream(Vec<Bytes>),
    /// Deliver these chunks, then fail the read
    StreamThenError(Vec<Bytes>, HttpError),
    /// Deliver these chunks, then keep the body open without data
    StreamThenHang(Vec<Bytes>),
}

impl MockResponse {
    /// Deliver `body` one byte per chunk, then end.
    pub fn bytewise(body: &[u8]) -> Self {
        MockResponse::Stream(body.iter().map(|b| Bytes::copy_from_slice(&[*b])).collect())
    }

    /// Deliver `body` as a single chunk, then end.
    pub fn whole(body: impl Into<Bytes>) -> Self {
        MockResponse::Stream(vec![body.into()])
    }
}

/// Mock HTTP client for testing.
///
/// # Example
///
/// ```ignore
/// use sse_resume::adapters::mock::{MockHttpClient, MockResponse};
///
/// let client = MockHttpClient::new();
/// client.push_response("http://test/stream", MockResponse::whole("id: 1\ndata: a\n\n"));
/// client.push_response("http://test/stream", MockResponse::whole("id: 2\ndata: b\n\n"));
/// // first connection gets event 1, the reconnect gets event 2
/// ```
#[derive(Debug, Clone)]
pub struct MockHttpClient {
    /// One-shot responses, consumed in order
    queued: Arc<Mutex<Vec<(String, MockResponse)>>>,
    /// Configured responses by URL pattern
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self {
            queued: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(HashMap::new())),
            default_response: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set a response returned for every request matching `url`.
    ///
    /// The URL is matched exactly first, then as a prefix.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), response);
    }

    /// Queue a response used once, by the next request whose URL starts with `url`.
    ///
    /// Queued responses take precedence over those set with [`set_response`].
    ///
    /// [`set_response`]: MockHttpClient::set_response
    pub fn push_response(&self, url: &str, response: MockResponse) {
        self.queued
            .lock()
            .unwrap()
            .push((url.to_string(), response));
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        let mut default = self.default_response.lock().unwrap();
        *default = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn record_request(&self, method: &str, url: &str, headers: &Headers, body: Option<String>) {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
    }

    /// Resolve the response for a request. Buffered requests never consume a
    /// queued streaming response.
    fn get_response(&self, url: &str, streaming: bool) -> Option<MockResponse> {
        {
            let mut queued = self.queued.lock().unwrap();
            let usable = |response: &MockResponse| {
                streaming || matches!(response, MockResponse::Success(_) | MockResponse::Error(_))
            };
            if let Some(index) = queued
                .iter()
                .position(|(pattern, response)| url.starts_with(pattern) && usable(response))
            {
                return Some(queued.remove(index).1);
            }
        }

        let responses = self.responses.lock().unwrap();

        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        for (pattern, response) in responses.iter() {
            if url.starts_with(pattern) {
                return Some(response.clone());
            }
        }

        let default = self.default_response.lock().unwrap();
        default.clone()
    }

    fn buffered(&self, url: &str) -> Result<Response, HttpError> {
        match self.get_response(url, false) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            Some(_) => Err(HttpError::Other(
                "Stream response on non-stream request".to_string(),
            )),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request("GET", url, headers, None);
        self.buffered(url)
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request("POST", url, headers, Some(body.to_string()));
        self.buffered(url)
    }

    async fn get_stream(&self, url: &str, headers: &Headers) -> Result<ByteStream, HttpError> {
        use futures::StreamExt;

        self.record_request("GET", url, headers, None);

        match self.get_response(url, true) {
            Some(MockResponse::Stream(chunks)) => {
                Ok(Box::pin(futures::stream::iter(
                    chunks.into_iter().map(Ok::<Bytes, HttpError>),
                )))
            }
            Some(MockResponse::StreamThenError(chunks, err)) => {
                let items = chunks
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(err)));
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Some(MockResponse::StreamThenHang(chunks)) => Ok(Box::pin(
                futures::stream::iter(chunks.into_iter().map(Ok::<Bytes, HttpError>))
                    .chain(futures::stream::pending()),
            )),
            Some(MockResponse::Success(response)) if response.status == 200 => {
                Ok(Box::pin(futures::stream::iter(vec![Ok::<Bytes, HttpError>(
                    response.body,
                )])))
            }
            Some(MockResponse::Success(response)) => Err(HttpError::ServerError {
                status: response.status,
                message: response.text_lossy(),
            }),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}
