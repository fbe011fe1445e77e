//! Client error types.

use thiserror::Error;

/// Errors surfaced to the CLI user.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Failed to establish or keep the WebSocket connection
    #[error("failed to connect to server: {0}")]
    ConnectionError(String),

    /// The server reported an error for our last request
    #[error("server error: {0}")]
    ServerError(String),
}
