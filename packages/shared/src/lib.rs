//! Shared building blocks for the relaychat server and client.
//!
//! - `protocol`: the message envelope exchanged over a connection and its
//!   length-delimited codec
//! - `logger`: tracing subscriber setup used by both binaries

pub mod logger;
pub mod protocol;
