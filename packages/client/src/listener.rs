//! Background listener receiving broadcasts from the server.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use futures_util::StreamExt;
use relaychat_shared::protocol::{Message, MessageCodec, ProtocolError};
use tokio::net::tcp::OwnedReadHalf;
use tokio_util::codec::FramedRead;

use crate::output::{LOST_CONNECTION, OutputHandler};

pub(crate) type Reader = FramedRead<OwnedReadHalf, MessageCodec>;

/// Flags shared by the connection and its listener.
///
/// `closing` is set by a local `disconnect()` before anything is sent, so the
/// listener can tell an intentional close from a lost connection.
#[derive(Debug)]
pub(crate) struct ConnectionState {
    connected: AtomicBool,
    closing: AtomicBool,
}

impl ConnectionState {
    pub(crate) fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            closing: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.is_closing()
    }

    pub(crate) fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    /// Mark the connection as closing; returns `true` if it already was.
    pub(crate) fn begin_closing(&self) -> bool {
        self.closing.swap(true, Ordering::SeqCst)
    }

    /// Whether the listener is still attached to a live connection.
    pub(crate) fn has_live_stream(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn mark_lost(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// Read broadcasts until the connection ends, forwarding each body to `output`.
pub(crate) async fn listen(
    mut reader: Reader,
    output: Arc<dyn OutputHandler>,
    state: Arc<ConnectionState>,
    read_timeout: Duration,
) {
    loop {
        let frame = match tokio::time::timeout(read_timeout, reader.next()).await {
            Ok(frame) => frame,
            Err(_) => {
                tracing::warn!("No message from server for {:?}", read_timeout);
                stop(&state, output.as_ref(), LOST_CONNECTION);
                return;
            }
        };

        match frame {
            Some(Ok(Message::Broadcast(text))) => output.handle_msg(&text),
            Some(Ok(other)) => {
                let notice = format!(
                    "Received corrupt message: unexpected {} from server",
                    other.kind()
                );
                stop(&state, output.as_ref(), &notice);
                return;
            }
            Some(Err(ProtocolError::CorruptMessage(reason))) => {
                let notice = format!("Received corrupt message: {reason}");
                stop(&state, output.as_ref(), &notice);
                return;
            }
            Some(Err(e)) => {
                tracing::debug!("Read from server failed: {}", e);
                stop(&state, output.as_ref(), LOST_CONNECTION);
                return;
            }
            None => {
                tracing::debug!("Server closed the connection");
                stop(&state, output.as_ref(), LOST_CONNECTION);
                return;
            }
        }
    }
}

fn stop(state: &ConnectionState, output: &dyn OutputHandler, notice: &str) {
    state.mark_lost();
    if state.is_closing() {
        tracing::debug!("Listener stopped after local disconnect");
    } else {
        tracing::warn!("{}", notice);
        output.handle_msg(notice);
    }
}
