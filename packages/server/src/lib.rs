//! Chat relay server.
//!
//! Accepts TCP connections, runs one [`handler::ConnectionHandler`] task per
//! client, and relays every chat entry to all connected clients through the
//! shared [`relay::RelayServer`]. Newcomers first receive the whole
//! conversation so far.

pub mod config;
pub mod conversation;
pub mod domain;
pub mod handler;
pub mod relay;
pub mod runner;
pub mod signal;

mod error;

pub use error::ServerError;
pub use runner::Server;
