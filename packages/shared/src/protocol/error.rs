//! Protocol-level errors.

use thiserror::Error;

/// Errors raised while reading or writing protocol messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The peer sent an envelope that does not follow the protocol
    #[error("Received corrupt message: {0}")]
    CorruptMessage(String),

    /// The underlying connection failed (reset, timeout, closed mid-frame)
    #[error("Connection failure: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, ProtocolError::CorruptMessage(_))
    }
}
