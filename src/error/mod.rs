//! Error types for the SSE client.
//!
//! - [`StreamError`]: why one stream session failed. Carried inside a
//!   session's termination and inspected by the reconnect policy.
//! - [`ClientError`]: failures of the facade's buffered calls (remote cancel,
//!   health probe, configuration).
//! - [`HandlerError`]: what an event handler may return. Handler failures are
//!   logged and discarded at the dispatch boundary; they never end a stream.
//!
//! Parsing anomalies (missing colon, unknown field, invalid UTF-8) are not
//! errors at all. The decoder and assembler normalize them silently.

mod client;
mod stream;

pub use client::ClientError;
pub use stream::StreamError;

/// Error an event handler may return. Swallowed by the session.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Return type of event handlers.
pub type HandlerResult = Result<(), HandlerError>;
