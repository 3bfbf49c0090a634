//! Client side of the relaychat protocol.
//!
//! [`ServerConnection`] opens a connection to a relay server, sends the
//! user's name and chat entries, and runs a background listener that hands
//! every broadcast to an [`OutputHandler`].

pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod output;
pub mod session;
pub mod ui;

mod listener;

pub use connection::ServerConnection;
pub use error::ClientError;
pub use output::OutputHandler;
