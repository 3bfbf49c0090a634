//! Client connection settings.

use std::time::Duration;

/// Give up connecting after this long.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Treat the server as gone if nothing arrives for this long.
pub const READ_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// How long `disconnect` waits for the listener before aborting it.
pub const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub teardown_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            teardown_timeout: TEARDOWN_TIMEOUT,
        }
    }
}
