//! Destination for everything the client has to show its user.

use std::sync::Arc;

use tokio::sync::mpsc;

/// Notice given once when the server connection is lost unexpectedly.
pub const LOST_CONNECTION: &str = "Lost connection.";

/// Receives broadcast text and connection notices from the background listener.
///
/// Called from the listener task, so implementations must not block for long.
#[cfg_attr(test, mockall::automock)]
pub trait OutputHandler: Send + Sync {
    fn handle_msg(&self, msg: &str);
}

/// Forwards every message into a channel; handy for tests and for callers that
/// want to consume output asynchronously.
impl OutputHandler for mpsc::UnboundedSender<String> {
    fn handle_msg(&self, msg: &str) {
        if self.send(msg.to_string()).is_err() {
            tracing::debug!("Output receiver dropped, discarding: {}", msg);
        }
    }
}

impl<T: OutputHandler + ?Sized> OutputHandler for Arc<T> {
    fn handle_msg(&self, msg: &str) {
        (**self).handle_msg(msg);
    }
}
