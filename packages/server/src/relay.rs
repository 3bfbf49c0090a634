//! Shared broadcast state: the conversation log and the live handler set.
//!
//! ## Atomicity
//!
//! Both the log append and the fan-out happen while the handler-set lock is
//! held, and registration takes its history snapshot under the same lock.
//! A broadcast is therefore seen by a newcomer exactly once: either in the
//! snapshot it replays or through its channel, never both and never neither.

use std::{collections::HashMap, fmt};

use relaychat_shared::protocol::{MessageKind, fits_in_frame};
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::conversation::ConversationLog;

/// Channel through which a handler receives broadcast text for its client.
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Identifies one connection handler in the live set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(Uuid);

impl HandlerId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owner of the single conversation and of every live handler's channel.
#[derive(Debug, Default)]
pub struct RelayServer {
    log: ConversationLog,
    /// Live set: handlers currently eligible to receive broadcasts
    handlers: Mutex<HashMap<HandlerId, PusherChannel>>,
}

impl RelayServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler to the live set.
    ///
    /// Returns the handler's id and the conversation so far, which the
    /// handler must replay to its client before anything it receives on
    /// `sender`'s channel.
    pub async fn register_handler(&self, sender: PusherChannel) -> (HandlerId, Vec<String>) {
        let mut handlers = self.handlers.lock().await;
        let id = HandlerId::generate();
        handlers.insert(id, sender);
        let history = self.log.snapshot();
        tracing::debug!(
            "Handler {} registered ({} live, {} entries to replay)",
            id,
            handlers.len(),
            history.len()
        );
        (id, history)
    }

    /// Remove a handler from the live set.
    ///
    /// Returns `false` if it was already gone; removing twice is a no-op.
    pub async fn remove_handler(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.lock().await;
        let removed = handlers.remove(&id).is_some();
        if removed {
            tracing::debug!("Handler {} removed ({} live)", id, handlers.len());
        }
        removed
    }

    /// Append `text` to the conversation and deliver it to every live handler,
    /// including the one that produced it.
    ///
    /// A handler whose channel is closed is logged and dropped from the live
    /// set; delivery to the others continues. Text too large for a single
    /// `BROADCAST` frame is refused outright and `false` is returned, since no
    /// client could ever receive it.
    pub async fn broadcast(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        if !fits_in_frame(MessageKind::Broadcast, Some(&text)) {
            tracing::warn!("Refusing to broadcast {} bytes: exceeds frame limit", text.len());
            return false;
        }
        let mut handlers = self.handlers.lock().await;

        self.log.append(text.clone());

        let mut failed = Vec::new();
        for (id, sender) in handlers.iter() {
            if sender.send(text.clone()).is_err() {
                tracing::warn!("Failed to deliver broadcast to handler {}", id);
                failed.push(*id);
            }
        }
        for id in failed {
            handlers.remove(&id);
        }

        tracing::debug!("Broadcasted to {} handlers: {}", handlers.len(), text);
        true
    }

    /// Number of handlers currently in the live set.
    pub async fn live_count(&self) -> usize {
        self.handlers.lock().await.len()
    }

    /// Copy of the whole conversation, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.log.snapshot()
    }
}
