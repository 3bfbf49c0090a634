//! Error types for the chat client.

use relaychat_shared::protocol::ProtocolError;
use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server could not be reached or the connection broke
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Connecting took longer than the configured timeout
    #[error("Timed out connecting to {0}")]
    Timeout(String),

    /// No live connection to send on
    #[error("Not connected to a server")]
    NotConnected,

    /// A message could not be encoded or written
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
