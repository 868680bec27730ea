//! Error types for the dialogue client.

use thiserror::Error;

/// Errors that can occur when talking to the dialogue service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Failed to establish connection.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Transport-level HTTP error (no usable response).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    /// A 2xx body that is not the expected JSON shape.
    #[error("serialization error: {message}")]
    Decode { message: String, body: String },
}

impl ClientError {
    /// True when no response was received at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Connection(_) | ClientError::Http(_))
    }
}
