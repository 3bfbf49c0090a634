//! Domain logic for a single participant's connection.
//!
//! This module contains pure functions and a small state machine without any
//! I/O, so the join/entry/leave rules can be tested in isolation.

use relaychat_shared::protocol::{MAX_FRAME_LENGTH, Message, MessageKind, fits_in_frame};

/// Username used until the client sends `USER`.
pub const DEFAULT_USERNAME: &str = "anonymous";

const JOIN_MESSAGE: &str = " joined conversation.";
const LEAVE_MESSAGE: &str = " left conversation.";
const USERNAME_DELIMITER: &str = ": ";

/// `"<name> joined conversation."`
pub fn join_notice(username: &str) -> String {
    format!("{username}{JOIN_MESSAGE}")
}

/// `"<name> left conversation."`
pub fn leave_notice(username: &str) -> String {
    format!("{username}{LEAVE_MESSAGE}")
}

/// `"<name>: <text>"`
pub fn entry_line(username: &str, text: &str) -> String {
    format!("{username}{USERNAME_DELIMITER}{text}")
}

/// Lifecycle of a connection handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    /// Accepted, history not yet replayed
    Starting,
    /// Replay done, processing inbound messages
    Active,
    /// Terminal; nothing more is sent or received
    Closed,
}

/// What the handler must do after an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Broadcast the text and keep going
    Broadcast(String),
    /// The client asked to leave; broadcast the notice after it has been removed
    Leave(String),
    /// The client broke the protocol; drop it without a notice
    Violation(String),
}

/// Per-connection participant state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    username: String,
    state: HandlerState,
}

impl Participant {
    pub fn new() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            state: HandlerState::Starting,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn state(&self) -> HandlerState {
        self.state
    }

    pub fn activate(&mut self) {
        if self.state == HandlerState::Starting {
            self.state = HandlerState::Active;
        }
    }

    pub fn close(&mut self) {
        self.state = HandlerState::Closed;
    }

    /// Apply one inbound message.
    ///
    /// Text is formatted with the username current at this moment; a later
    /// rename does not touch entries that were already produced. A message
    /// whose broadcast would not fit in one frame is a violation by its
    /// sender and never reaches the conversation.
    pub fn apply(&mut self, message: Message) -> Transition {
        if self.state != HandlerState::Active {
            return Transition::Violation(format!(
                "{} received while handler is {:?}",
                message.kind(),
                self.state
            ));
        }

        match message {
            Message::User(username) => {
                let notice = join_notice(&username);
                if !broadcast_fits(&notice) {
                    self.state = HandlerState::Closed;
                    return oversized(MessageKind::User);
                }
                // A name whose join notice fits also fits its shorter leave notice
                self.username = username;
                Transition::Broadcast(notice)
            }
            Message::Entry(text) => {
                let line = entry_line(&self.username, &text);
                if !broadcast_fits(&line) {
                    self.state = HandlerState::Closed;
                    return oversized(MessageKind::Entry);
                }
                Transition::Broadcast(line)
            }
            Message::Disconnect => {
                self.state = HandlerState::Closed;
                Transition::Leave(leave_notice(&self.username))
            }
            Message::Broadcast(_) => {
                self.state = HandlerState::Closed;
                Transition::Violation(format!(
                    "{} is a server-to-client message",
                    MessageKind::Broadcast
                ))
            }
        }
    }
}

fn broadcast_fits(text: &str) -> bool {
    fits_in_frame(MessageKind::Broadcast, Some(text))
}

fn oversized(kind: MessageKind) -> Transition {
    Transition::Violation(format!(
        "{kind} would produce a broadcast larger than {MAX_FRAME_LENGTH} bytes"
    ))
}

impl Default for Participant {
    fn default() -> Self {
        Self::new()
    }
}
