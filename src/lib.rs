//! sse-resume - a resumable Server-Sent Events client
//!
//! Opens a long-lived HTTP stream, cuts the body into frames whatever the
//! chunking, hands each event to a callback, and reconnects with
//! `Last-Event-ID` so a broken stream picks up after the last delivered id.
//!
//! This library exposes modules for use by the binary and integration tests.

pub mod adapters;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod sse;
pub mod traits;

pub use client::StreamClient;
pub use config::{ReconnectConfig, StreamConfig};
pub use error::{ClientError, HandlerError, HandlerResult, StreamError};
pub use sse::{
    default_should_reconnect, CancelHandle, Event, ReconnectController, StreamRequest,
    StreamSession, Termination,
};
