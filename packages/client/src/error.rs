//! Error types for the Tandem client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server refused the room or user parameters
    #[error("Server rejected the connection parameters: {0}")]
    InvalidIdentity(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// A stdin line that could not be turned into a message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("nothing to send")]
    Empty,

    #[error("usage: {0}")]
    Usage(&'static str),
}
