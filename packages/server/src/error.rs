//! Error types for the relay server.

use thiserror::Error;

/// Server-level errors. Per-connection failures never surface here; they are
/// logged by the handler that owns the connection.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening endpoint could not be established
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The listener itself failed while waiting for connections
    #[error("Failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),

    /// The bound address could not be read back from the socket
    #[error("Failed to read local address: {0}")]
    LocalAddr(#[source] std::io::Error),
}
