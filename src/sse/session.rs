//! One HTTP connection carrying an event stream.
//!
//! A session is single-use:
//!
//! ```text
//! Connecting --open ok--> Streaming --end of body--> Ended
//!     |                      |------read error-----> Failed
//!     |--open error--> Failed|------cancel---------> Cancelled
//!     |--cancel----> Cancelled
//! ```
//!
//! Events are handed to the handler synchronously and in order. Whatever the
//! handler does, including returning an error or panicking, never changes
//! the session's state.

use std::panic::{catch_unwind, AssertUnwindSafe};

use futures::StreamExt;
use tracing::{debug, info, warn};

use super::cancel::CancelHandle;
use super::decoder::FrameDecoder;
use super::event::Event;
use super::request::StreamRequest;
use crate::error::{HandlerResult, StreamError};
use crate::traits::{ByteStream, HttpClient, HttpError};

/// Event name a server sends to announce it is closing the stream on request.
pub const SERVER_CANCEL_EVENT: &str = "cancelled";

/// Lifecycle state of a [`StreamSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Connecting,
    Streaming,
    Cancelled,
    Failed,
    Ended,
}

impl SessionStatus {
    /// Whether the session has stopped for good.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Cancelled | SessionStatus::Failed | SessionStatus::Ended
        )
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionStatus::Connecting => "connecting",
            SessionStatus::Streaming => "streaming",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Failed => "failed",
            SessionStatus::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// How a session stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// The server closed the body normally.
    Ended,
    /// The client closed the connection, or the server announced a cancel
    /// before closing.
    Cancelled,
    /// Connecting or reading failed.
    Failed(StreamError),
}

impl Termination {
    pub fn status(&self) -> SessionStatus {
        match self {
            Termination::Ended => SessionStatus::Ended,
            Termination::Cancelled => SessionStatus::Cancelled,
            Termination::Failed(_) => SessionStatus::Failed,
        }
    }

    pub fn error(&self) -> Option<&StreamError> {
        match self {
            Termination::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub termination: Termination,
    /// Resume cursor at the moment the session stopped.
    pub last_event_id: Option<String>,
    pub events_delivered: u64,
    /// Events whose handler returned an error or panicked.
    pub handler_failures: u64,
}

/// A single connection attempt and the events read from it.
pub struct StreamSession {
    status: SessionStatus,
    last_event_id: Option<String>,
    decoder: FrameDecoder,
    body: Option<ByteStream>,
    termination: Option<Termination>,
    cancel: CancelHandle,
    server_cancelled: bool,
    events_delivered: u64,
    handler_failures: u64,
}

impl StreamSession {
    /// Create a session that resumes from `resume_id` and stops when `cancel`
    /// fires.
    pub fn new(resume_id: Option<String>, cancel: CancelHandle) -> Self {
        Self {
            status: SessionStatus::Connecting,
            last_event_id: resume_id,
            decoder: FrameDecoder::new(),
            body: None,
            termination: None,
            cancel,
            server_cancelled: false,
            events_delivered: 0,
            handler_failures: 0,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Id of the most recent event that carried one, or the resume id the
    /// session started from.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    pub fn events_delivered(&self) -> u64 {
        self.events_delivered
    }

    pub fn handler_failures(&self) -> u64 {
        self.handler_failures
    }

    /// Handle that closes this session.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Issue the GET for `request`.
    ///
    /// On success the session is `Streaming`. Otherwise it is terminal and the
    /// termination is returned as the error.
    pub async fn open<C>(&mut self, client: &C, request: &StreamRequest) -> Result<(), Termination>
    where
        C: HttpClient + ?Sized,
    {
        if self.status != SessionStatus::Connecting {
            return Err(Termination::Failed(StreamError::Unreachable(
                HttpError::Other(format!("session already {}", self.status)),
            )));
        }

        let url = request.url();
        let headers = request.headers(self.last_event_id.as_deref());
        match self.last_event_id.as_deref() {
            Some(id) => info!("Opening event stream {} (resuming after {})", url, id),
            None => info!("Opening event stream {}", url),
        }

        let cancel = self.cancel.clone();
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = client.get_stream(&url, &headers) => Some(result),
        };

        match opened {
            None => {
                debug!("Cancelled while connecting to {}", url);
                Err(self.finish(Termination::Cancelled))
            }
            Some(Ok(body)) => {
                self.body = Some(body);
                self.status = SessionStatus::Streaming;
                Ok(())
            }
            Some(Err(e)) => {
                let err = StreamError::from_open(e);
                warn!("Failed to open event stream {}: {}", url, err);
                Err(self.finish(Termination::Failed(err)))
            }
        }
    }

    /// Read until the stream stops, delivering each complete frame to
    /// `handler`.
    ///
    /// Cancellation is observed before every read, while waiting for bytes,
    /// and between events of the same chunk. Bytes that never formed a
    /// complete frame are discarded.
    pub async fn drive<H>(&mut self, handler: &mut H) -> Termination
    where
        H: FnMut(&Event) -> HandlerResult,
    {
        let Some(mut body) = self.body.take() else {
            if let Some(termination) = self.termination.clone() {
                return termination;
            }
            return self.finish(Termination::Failed(StreamError::Unreachable(
                HttpError::Other("stream was not opened".to_string()),
            )));
        };

        let cancel = self.cancel.clone();
        loop {
            if cancel.is_cancelled() {
                return self.finish(Termination::Cancelled);
            }

            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                chunk = body.next() => Some(chunk),
            };

            match next {
                None => return self.finish(Termination::Cancelled),
                Some(Some(Ok(chunk))) => {
                    for block in self.decoder.feed(&chunk) {
                        if cancel.is_cancelled() {
                            return self.finish(Termination::Cancelled);
                        }
                        self.deliver(Event::assemble(&block), handler);
                    }
                }
                Some(Some(Err(e))) => {
                    warn!("Event stream read failed: {}", e);
                    return self.finish(Termination::Failed(StreamError::Transport(e)));
                }
                Some(None) => {
                    let termination = if self.server_cancelled {
                        Termination::Cancelled
                    } else {
                        Termination::Ended
                    };
                    return self.finish(termination);
                }
            }
        }
    }

    /// Open and drive to completion.
    pub async fn run<C, H>(
        mut self,
        client: &C,
        request: &StreamRequest,
        handler: &mut H,
    ) -> SessionReport
    where
        C: HttpClient + ?Sized,
        H: FnMut(&Event) -> HandlerResult,
    {
        let termination = match self.open(client, request).await {
            Ok(()) => self.drive(handler).await,
            Err(termination) => termination,
        };

        SessionReport {
            termination,
            last_event_id: self.last_event_id,
            events_delivered: self.events_delivered,
            handler_failures: self.handler_failures,
        }
    }

    fn deliver<H>(&mut self, event: Event, handler: &mut H)
    where
        H: FnMut(&Event) -> HandlerResult,
    {
        if let Some(id) = event.id() {
            self.last_event_id = Some(id.to_string());
        }
        if event.name() == Some(SERVER_CANCEL_EVENT) {
            debug!("Server announced cancellation");
            self.server_cancelled = true;
        }

        debug!(
            "Dispatching event type={} id={:?} ({} bytes)",
            event.event_type(),
            event.id(),
            event.data().len()
        );
        self.events_delivered += 1;

        match catch_unwind(AssertUnwindSafe(|| handler(&event))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.handler_failures += 1;
                warn!("Event handler failed on {:?}: {}", event.id(), e);
            }
            Err(_) => {
                self.handler_failures += 1;
                warn!("Event handler panicked on {:?}", event.id());
            }
        }
    }

    fn finish(&mut self, termination: Termination) -> Termination {
        self.body = None;
        if !self.decoder.is_empty() {
            debug!("Discarding {} bytes of incomplete frame", self.decoder.pending_len());
        }
        self.decoder.clear();
        self.status = termination.status();
        info!("Event stream {}", self.status);
        self.termination = Some(termination.clone());
        termination
    }
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("status", &self.status)
            .field("last_event_id", &self.last_event_id)
            .field("pending_bytes", &self.decoder.pending_len())
            .field("events_delivered", &self.events_delivered)
            .field("handler_failures", &self.handler_failures)
            .finish()
    }
}
