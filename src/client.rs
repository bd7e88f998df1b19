//! Stream server client.
//!
//! Bundles the configured endpoints with an HTTP transport: opens event
//! streams (single session or with automatic resume), asks the server to
//! cancel a stream, and probes server health.

use std::sync::Arc;

use tracing::{debug, info};

use crate::adapters::ReqwestHttpClient;
use crate::config::StreamConfig;
use crate::error::{ClientError, HandlerResult};
use crate::sse::{
    CancelHandle, Event, ReconnectController, RunOutcome, SessionReport, StreamRequest,
    StreamSession, Termination,
};
use crate::traits::{Headers, HttpClient};

/// Client for an event stream server.
///
/// # Example
///
/// ```ignore
/// use sse_resume::client::StreamClient;
/// use sse_resume::sse::default_should_reconnect;
///
/// let client = StreamClient::new()?;
/// let request = client.request().with_stream_id("job-42");
/// let outcome = client
///     .run(&request, |event| {
///         println!("{}: {}", event.event_type(), event.data());
///         Ok(())
///     }, default_should_reconnect)
///     .await;
/// ```
pub struct StreamClient {
    config: StreamConfig,
    http: Arc<dyn HttpClient>,
}

impl StreamClient {
    /// Create a client with the default configuration.
    pub fn new() -> Result<Self, ClientError> {
        Self::from_config(StreamConfig::default())
    }

    /// Create a client backed by reqwest, honoring the configured timeouts.
    pub fn from_config(config: StreamConfig) -> Result<Self, ClientError> {
        let http = ReqwestHttpClient::with_timeouts(config.connect_timeout, config.read_timeout)?;
        Ok(Self::with_http_client(config, Arc::new(http)))
    }

    /// Create a client on top of any transport.
    pub fn with_http_client(config: StreamConfig, http: Arc<dyn HttpClient>) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn http_client(&self) -> Arc<dyn HttpClient> {
        Arc::clone(&self.http)
    }

    /// A request for the configured stream endpoint.
    pub fn request(&self) -> StreamRequest {
        StreamRequest::new(self.config.stream_url())
    }

    /// Open one session without reading from it yet.
    ///
    /// The session resumes from the request's `last_event_id`, if any.
    pub async fn open(
        &self,
        request: &StreamRequest,
        cancel: CancelHandle,
    ) -> Result<StreamSession, Termination> {
        let resume = request.last_event_id().map(str::to_string);
        let mut session = StreamSession::new(resume, cancel);
        session.open(self.http.as_ref(), request).await?;
        Ok(session)
    }

    /// Stream a single session to completion, without reconnecting.
    pub async fn stream<H>(
        &self,
        request: &StreamRequest,
        cancel: CancelHandle,
        mut on_event: H,
    ) -> SessionReport
    where
        H: FnMut(&Event) -> HandlerResult,
    {
        let resume = request.last_event_id().map(str::to_string);
        StreamSession::new(resume, cancel)
            .run(self.http.as_ref(), request, &mut on_event)
            .await
    }

    /// A reconnect controller using this client's transport and backoff
    /// settings. Use it directly to observe state or cancel from elsewhere.
    pub fn reconnecting(&self) -> ReconnectController {
        ReconnectController::new(self.http_client(), self.config.reconnect.clone())
    }

    /// Stream with automatic resume until `should_reconnect` says stop.
    pub async fn run<H, R>(
        &self,
        request: &StreamRequest,
        on_event: H,
        should_reconnect: R,
    ) -> RunOutcome
    where
        H: FnMut(&Event) -> HandlerResult,
        R: FnMut(&Termination) -> bool,
    {
        self.reconnecting()
            .run(request, on_event, should_reconnect)
            .await
    }

    /// Ask the server to cancel the stream named `stream_id`.
    ///
    /// Sends `POST {cancel_path}` with body `{"id": "<stream_id>"}`. A server
    /// that honors it emits a `cancelled` event and closes the stream.
    pub async fn cancel(&self, stream_id: &str) -> Result<(), ClientError> {
        let url = self.config.cancel_url();
        let body = serde_json::to_string(&serde_json::json!({ "id": stream_id }))?;

        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        debug!("Requesting cancel of stream {} at {}", stream_id, url);
        let response = self.http.post(&url, &body, &headers).await?;

        if !response.is_success() {
            return Err(ClientError::Status {
                status: response.status,
                message: response.text_lossy(),
            });
        }

        info!("Cancel requested for stream {}", stream_id);
        Ok(())
    }

    /// Check if the server is healthy and reachable.
    ///
    /// # Returns
    /// `true` if the health endpoint answers with a 2xx status, `false` for
    /// any other status. Transport failures are errors.
    pub async fn health_check(&self) -> Result<bool, ClientError> {
        let url = self.config.health_url();
        let response = self.http.get(&url, &Headers::new()).await?;
        Ok(response.is_success())
    }
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("config", &self.config)
            .finish()
    }
}
