//! Errors from the client facade's request/response calls.

use thiserror::Error;

use crate::traits::HttpError;

/// Error type for [`StreamClient`](crate::client::StreamClient) operations
/// other than streaming itself (remote cancel, health probe, configuration).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got a response
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// The server answered with a non-success status
    #[error("Server error ({status}): {message}")]
    Status { status: u16, message: String },

    /// A JSON body could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The client was configured with unusable settings
    #[error("Invalid configuration: {0}")]
    Config(String),
}
