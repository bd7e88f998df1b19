//! HTTP client trait abstraction.
//!
//! The SSE core never talks to a concrete HTTP library. Everything it needs
//! from the transport (a streaming GET, plus the plain GET/POST used by the
//! health probe and the cancel side-channel) goes through [`HttpClient`], so
//! sessions can be driven by reqwest in production and by scripted byte
//! streams in tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Incrementally delivered response body.
///
/// `None` from the stream means the server closed the body; an `Err` item is a
/// transport failure mid-stream.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// Fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, body: Bytes) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    /// Create a new response with headers.
    pub fn with_headers(status: u16, headers: Headers, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpError {
    /// Connection could not be established
    ConnectionFailed(String),
    /// Connect or read timeout
    Timeout(String),
    /// Server answered with an unexpected status
    ServerError { status: u16, message: String },
    /// Body read failed
    Io(String),
    /// URL could not be parsed
    InvalidUrl(String),
    /// Anything else
    Other(String),
}

impl HttpError {
    /// Status code carried by this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            HttpError::Timeout(msg) => write!(f, "Request timeout: {}", msg),
            HttpError::ServerError { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
            HttpError::Io(msg) => write!(f, "IO error: {}", msg),
            HttpError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            HttpError::Other(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

/// Trait for HTTP client operations.
///
/// Implementations include the production [`ReqwestHttpClient`] and the
/// scripted [`MockHttpClient`] used by the test suites.
///
/// [`ReqwestHttpClient`]: crate::adapters::ReqwestHttpClient
/// [`MockHttpClient`]: crate::adapters::MockHttpClient
///
/// # Example
///
/// ```ignore
/// use sse_resume::traits::{HttpClient, Headers, HttpError};
///
/// async fn probe<C: HttpClient>(client: &C) -> Result<bool, HttpError> {
///     let response = client.get("http://127.0.0.1:4390/health", &Headers::new()).await?;
///     Ok(response.is_success())
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request and buffer the body.
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError>;

    /// Perform a POST request and buffer the body.
    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError>;

    /// Perform a GET request whose body is consumed incrementally.
    ///
    /// Any status other than `200` must be reported as
    /// [`HttpError::ServerError`] carrying the status verbatim; the caller
    /// never sees a body stream for a rejected request.
    async fn get_stream(&self, url: &str, headers: &Headers) -> Result<ByteStream, HttpError>;
}
