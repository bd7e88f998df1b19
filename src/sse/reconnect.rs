//! Reconnect controller.
//!
//! Runs one [`StreamSession`] at a time for a logical stream. When a session
//! stops, the caller's policy decides whether to open another one; the new
//! session resumes from the last id the previous one saw, after a capped
//! exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use super::cancel::CancelHandle;
use super::event::Event;
use super::request::StreamRequest;
use super::session::{StreamSession, Termination};
use crate::config::ReconnectConfig;
use crate::error::HandlerResult;
use crate::traits::HttpClient;

/// Connection state published while a controller runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// `run` has not been called yet
    Idle,
    /// Opening a session; `attempt` is 0 for the first connection
    Connecting { attempt: u32 },
    Streaming,
    /// Waiting before reconnect number `attempt`
    Backoff { attempt: u32, delay: Duration },
    Stopped,
}

/// Result of a whole controller run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// How the last session stopped, or `Cancelled` if a backoff was cut short
    pub termination: Termination,
    pub last_event_id: Option<String>,
    pub sessions: u32,
    pub events_delivered: u64,
    pub handler_failures: u64,
}

/// Reconnect after failures; stop after an explicit cancel or a clean end.
///
/// Pass this to [`ReconnectController::run`] or write a closure of your own,
/// for example one that only reconnects when
/// [`StreamError::is_retryable`](crate::error::StreamError::is_retryable).
pub fn default_should_reconnect(termination: &Termination) -> bool {
    matches!(termination, Termination::Failed(_))
}

/// Drives sessions for one logical stream and carries the resume cursor
/// between them.
pub struct ReconnectController {
    client: Arc<dyn HttpClient>,
    config: ReconnectConfig,
    cancel: CancelHandle,
    state_tx: watch::Sender<ConnectionState>,
}

impl ReconnectController {
    pub fn new(client: Arc<dyn HttpClient>, config: ReconnectConfig) -> Self {
        let (state_tx, _state_rx) = watch::channel(ConnectionState::Idle);
        Self {
            client,
            config,
            cancel: CancelHandle::new(),
            state_tx,
        }
    }

    pub fn config(&self) -> &ReconnectConfig {
        &self.config
    }

    /// Handle that closes the current connection, or stops a pending backoff.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Watch the connection state.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Stream `request` until `should_reconnect` declines to continue, the
    /// retry budget is exhausted, or a backoff is cancelled.
    ///
    /// The first session resumes from `request`'s own `last_event_id`, if
    /// any. A cancel closes one connection: once a session has stopped
    /// because of it, the handle is re-armed for the next one. A cancel that
    /// arrives after a session stopped for another reason is still honoured
    /// by the backoff that follows.
    pub async fn run<H, R>(
        &self,
        request: &StreamRequest,
        mut on_event: H,
        mut should_reconnect: R,
    ) -> RunOutcome
    where
        H: FnMut(&Event) -> HandlerResult,
        R: FnMut(&Termination) -> bool,
    {
        let mut cursor = request.last_event_id().map(str::to_string);
        let mut attempt: u32 = 0;
        let mut sessions: u32 = 0;
        let mut events_delivered: u64 = 0;
        let mut handler_failures: u64 = 0;
        let mut armed = self.cancel.clone();

        loop {
            self.set_state(ConnectionState::Connecting { attempt });
            sessions += 1;

            let mut session = StreamSession::new(cursor.clone(), armed.clone());
            let termination = match session.open(self.client.as_ref(), request).await {
                Ok(()) => {
                    if attempt > 0 {
                        info!("Reconnected successfully on attempt {}", attempt);
                    }
                    self.set_state(ConnectionState::Streaming);
                    session.drive(&mut on_event).await
                }
                Err(termination) => termination,
            };

            cursor = session.last_event_id().map(str::to_string);
            events_delivered += session.events_delivered();
            handler_failures += session.handler_failures();
            if session.events_delivered() > 0 {
                attempt = 0;
            }

            let finish = |termination: Termination| RunOutcome {
                termination,
                last_event_id: cursor.clone(),
                sessions,
                events_delivered,
                handler_failures,
            };

            if !should_reconnect(&termination) {
                debug!("Not reconnecting after {:?}", termination);
                self.set_state(ConnectionState::Stopped);
                return finish(termination);
            }

            attempt += 1;
            if !self.config.allows(attempt) {
                error!(
                    "Failed to reconnect after {} attempts, giving up",
                    attempt - 1
                );
                self.set_state(ConnectionState::Stopped);
                return finish(termination);
            }

            if termination == Termination::Cancelled {
                armed = self.cancel.rearmed();
            }
            let delay = self.config.delay_for(attempt);
            match self.config.max_retries {
                Some(max) => info!(
                    "Reconnection attempt {} of {}, waiting {:?}",
                    attempt, max, delay
                ),
                None => info!("Reconnection attempt {}, waiting {:?}", attempt, delay),
            }
            self.set_state(ConnectionState::Backoff { attempt, delay });

            let cancelled = tokio::select! {
                biased;
                _ = armed.cancelled() => true,
                _ = tokio::time::sleep(delay) => false,
            };
            if cancelled {
                debug!("Cancel requested during backoff");
                self.set_state(ConnectionState::Stopped);
                return finish(Termination::Cancelled);
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }
}

impl std::fmt::Debug for ReconnectController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconnectController")
            .field("config", &self.config)
            .field("state", &*self.state_tx.borrow())
            .finish()
    }
}
