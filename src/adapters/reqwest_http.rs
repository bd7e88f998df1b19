//! Reqwest-based HTTP client adapter.
//!
//! Production implementation of [`HttpClient`]. The connect timeout bounds
//! both the TCP/TLS handshake (set on the underlying `reqwest::Client`) and
//! the wait for response headers once connected. The optional read timeout
//! bounds the gap between two body chunks of a streaming response, so an idle
//! stream fails instead of hanging forever.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use std::time::Duration;

use crate::traits::{ByteStream, Headers, HttpClient, HttpError, Response};

/// HTTP client implementation using reqwest.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use sse_resume::adapters::ReqwestHttpClient;
///
/// let client = ReqwestHttpClient::with_timeouts(Duration::from_secs(10), None)?;
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    response_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
}

impl ReqwestHttpClient {
    /// Create a new ReqwestHttpClient with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            response_timeout: None,
            read_timeout: None,
        }
    }

    /// Create a client with a connect timeout and an optional per-chunk read timeout.
    ///
    /// `connect_timeout` also limits how long a request waits for the
    /// response headers.
    pub fn with_timeouts(
        connect_timeout: Duration,
        read_timeout: Option<Duration>,
    ) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(Self::convert_error)?;
        Ok(Self {
            client,
            response_timeout: Some(connect_timeout),
            read_timeout,
        })
    }

    /// Get a reference to the underlying reqwest::Client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Configured read timeout, if any.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Limit on the wait for response headers, if any.
    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout
    }

    /// Send the request, failing with [`HttpError::Timeout`] when no response
    /// headers arrive within the response timeout.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, HttpError> {
        match self.response_timeout {
            Some(limit) => match tokio::time::timeout(limit, builder.send()).await {
                Ok(result) => result.map_err(Self::convert_error),
                Err(_) => Err(HttpError::Timeout(format!(
                    "no response within {}ms",
                    limit.as_millis()
                ))),
            },
            None => builder.send().await.map_err(Self::convert_error),
        }
    }

    /// Convert a request-phase reqwest error to HttpError.
    fn convert_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else if err.is_connect() {
            HttpError::ConnectionFailed(err.to_string())
        } else if err.is_builder() {
            HttpError::InvalidUrl(err.to_string())
        } else {
            HttpError::Other(err.to_string())
        }
    }

    /// Convert a body-phase reqwest error to HttpError.
    fn convert_body_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else {
            HttpError::Io(err.to_string())
        }
    }

    /// Convert reqwest headers to our Headers type.
    fn convert_headers(headers: &reqwest::header::HeaderMap) -> Headers {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    /// Apply headers to a request builder.
    fn apply_headers(
        builder: reqwest::RequestBuilder,
        headers: &Headers,
    ) -> reqwest::RequestBuilder {
        let mut builder = builder;
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Fail the stream with [`HttpError::Timeout`] when no chunk arrives within `limit`.
///
/// The stream ends right after yielding the timeout error.
fn with_read_timeout(body: ByteStream, limit: Duration) -> ByteStream {
    let stream = futures::stream::unfold(Some(body), move |state| async move {
        let mut body = state?;
        match tokio::time::timeout(limit, body.next()).await {
            Ok(Some(item)) => Some((item, Some(body))),
            Ok(None) => None,
            Err(_) => Some((
                Err(HttpError::Timeout(format!(
                    "no data received for {}ms",
                    limit.as_millis()
                ))),
                None,
            )),
        }
    });
    Box::pin(stream)
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        let builder = Self::apply_headers(self.client.get(url), headers);

        let response = self.send(builder).await?;

        let status = response.status().as_u16();
        let response_headers = Self::convert_headers(response.headers());
        let body = response.bytes().await.map_err(Self::convert_body_error)?;

        Ok(Response::with_headers(status, response_headers, body))
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        let builder = self.client.post(url).body(body.to_string());
        let builder = Self::apply_headers(builder, headers);

        let response = self.send(builder).await?;

        let status = response.status().as_u16();
        let response_headers = Self::convert_headers(response.headers());
        let body = response.bytes().await.map_err(Self::convert_body_error)?;

        Ok(Response::with_headers(status, response_headers, body))
    }

    async fn get_stream(&self, url: &str, headers: &Headers) -> Result<ByteStream, HttpError> {
        let builder = Self::apply_headers(self.client.get(url), headers);

        let response = self.send(builder).await?;

        let status = response.status().as_u16();
        if status != 200 {
            let text = match self.response_timeout {
                Some(limit) => tokio::time::timeout(limit, response.text())
                    .await
                    .ok()
                    .and_then(Result::ok),
                None => response.text().await.ok(),
            };
            let message = text.unwrap_or_else(|| "Unknown error".to_string());
            return Err(HttpError::ServerError { status, message });
        }

        let body: ByteStream = Box::pin(
            response
                .bytes_stream()
                .map(|result: reqwest::Result<Bytes>| result.map_err(Self::convert_body_error)),
        );

        Ok(match self.read_timeout {
            Some(limit) => with_read_timeout(body, limit),
            None => body,
        })
    }
}
