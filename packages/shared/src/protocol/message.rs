//! Domain representation of a protocol message.

use serde::{Deserialize, Serialize};

/// The closed set of message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    /// Client tells the server its (new) username.
    User,
    /// Client submits a chat entry to be broadcast.
    Entry,
    /// Server delivers one conversation entry to a client.
    Broadcast,
    /// Client is about to close; the server releases its resources.
    Disconnect,
}

impl MessageKind {
    /// Whether messages of this kind carry a text body.
    pub fn has_body(self) -> bool {
        !matches!(self, MessageKind::Disconnect)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::User => "USER",
            MessageKind::Entry => "ENTRY",
            MessageKind::Broadcast => "BROADCAST",
            MessageKind::Disconnect => "DISCONNECT",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message between a chat client and the chat server.
///
/// Only the variants that need a body carry one, so a `USER` without a name
/// or a `DISCONNECT` with a payload cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    User(String),
    Entry(String),
    Broadcast(String),
    Disconnect,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::User(_) => MessageKind::User,
            Message::Entry(_) => MessageKind::Entry,
            Message::Broadcast(_) => MessageKind::Broadcast,
            Message::Disconnect => MessageKind::Disconnect,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            Message::User(body) | Message::Entry(body) | Message::Broadcast(body) => Some(body),
            Message::Disconnect => None,
        }
    }

    /// Consume the message and return its body, if it has one.
    pub fn into_body(self) -> Option<String> {
        match self {
            Message::User(body) | Message::Entry(body) | Message::Broadcast(body) => Some(body),
            Message::Disconnect => None,
        }
    }
}
