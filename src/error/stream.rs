//! Streaming-related error types.
//!
//! These are the reasons a single stream session can fail. They are reported
//! to the reconnect controller as part of the session's termination and are
//! never raised into the event handler.

use std::fmt;

use crate::traits::HttpError;

/// Why a stream session failed.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// The server answered the stream request with a status other than 200.
    Connect {
        status: u16,
        message: String,
    },

    /// No response was obtained (refused, DNS, connect timeout, bad URL).
    Unreachable(HttpError),

    /// The body failed after the stream was established.
    Transport(HttpError),
}

impl StreamError {
    /// Classify an error returned while opening the stream.
    pub fn from_open(err: HttpError) -> Self {
        match err {
            HttpError::ServerError { status, message } => StreamError::Connect { status, message },
            other => StreamError::Unreachable(other),
        }
    }

    /// HTTP status of a rejected stream request.
    pub fn status(&self) -> Option<u16> {
        match self {
            StreamError::Connect { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error is likely transient and a reconnect may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            StreamError::Connect { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            StreamError::Unreachable(HttpError::InvalidUrl(_)) => false,
            StreamError::Unreachable(_) => true,
            StreamError::Transport(_) => true,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::Connect { status, .. } => {
                format!("The server refused the event stream (HTTP {}).", status)
            }
            StreamError::Unreachable(HttpError::Timeout(_)) => {
                "Timed out while connecting to the event stream.".to_string()
            }
            StreamError::Unreachable(HttpError::InvalidUrl(_)) => {
                "The event stream URL is invalid.".to_string()
            }
            StreamError::Unreachable(_) => {
                "Unable to reach the event stream server.".to_string()
            }
            StreamError::Transport(_) => {
                "The event stream was interrupted.".to_string()
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::Connect { .. } => "E_STREAM_CONNECT",
            StreamError::Unreachable(_) => "E_STREAM_UNREACHABLE",
            StreamError::Transport(_) => "E_STREAM_TRANSPORT",
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Connect { status, message } => {
                if message.is_empty() {
                    write!(f, "Stream rejected with HTTP {}", status)
                } else {
                    write!(f, "Stream rejected with HTTP {}: {}", status, message)
                }
            }
            StreamError::Unreachable(err) => write!(f, "Stream unreachable: {}", err),
            StreamError::Transport(err) => write!(f, "Stream read failed: {}", err),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Connect { .. } => None,
            StreamError::Unreachable(err) | StreamError::Transport(err) => Some(err),
        }
    }
}
