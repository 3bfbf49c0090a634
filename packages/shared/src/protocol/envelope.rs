//! JSON envelope carried inside each frame, and its conversion to [`Message`].

use serde::{Deserialize, Serialize};

use super::{
    error::ProtocolError,
    message::{Message, MessageKind},
};

/// Serialized form of a [`Message`]: `{"kind":"ENTRY","body":"hello"}`.
///
/// The envelope itself does not enforce the kind/body pairing; that check is
/// done when converting into a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

// ========================================
// Envelope → Message
// ========================================

impl TryFrom<Envelope> for Message {
    type Error = ProtocolError;

    fn try_from(envelope: Envelope) -> Result<Self, Self::Error> {
        match (envelope.kind, envelope.body) {
            (MessageKind::User, Some(body)) => Ok(Message::User(body)),
            (MessageKind::Entry, Some(body)) => Ok(Message::Entry(body)),
            (MessageKind::Broadcast, Some(body)) => Ok(Message::Broadcast(body)),
            (MessageKind::Disconnect, None) => Ok(Message::Disconnect),
            (kind, Some(_)) => Err(ProtocolError::CorruptMessage(format!(
                "{kind} message must not carry a body"
            ))),
            (kind, None) => Err(ProtocolError::CorruptMessage(format!(
                "{kind} message is missing its body"
            ))),
        }
    }
}

// ========================================
// Message → Envelope
// ========================================

impl From<Message> for Envelope {
    fn from(message: Message) -> Self {
        Self {
            kind: message.kind(),
            body: message.into_body(),
        }
    }
}
