//! Server configuration.

use std::time::Duration;

use thiserror::Error;

/// Port used when none (or an invalid one) is given on the command line.
pub const DEFAULT_PORT: u16 = 8080;
/// Listen on all interfaces by default.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// How long a closing connection may linger to flush unsent data.
pub const LINGER_TIME: Duration = Duration::from_secs(5);
/// A client that sends nothing for this long is treated as gone.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Configuration errors. These are always recovered by falling back to a default.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid port number '{0}'")]
    InvalidPort(String),
}

/// Settings for the listening endpoint and accepted connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Idle read timeout applied to every client connection
    pub idle_timeout: Duration,
    /// `SO_LINGER` applied to every accepted socket
    pub linger: Duration,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            idle_timeout: IDLE_TIMEOUT,
            linger: LINGER_TIME,
        }
    }
}

/// Parse a port number given as text.
pub fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    raw.trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidPort(raw.to_string()))
}

/// Resolve the optional command-line port argument.
///
/// Absent means [`DEFAULT_PORT`]. An unparsable value is reported as a
/// warning and also falls back to [`DEFAULT_PORT`].
pub fn resolve_port(raw: Option<&str>) -> u16 {
    let Some(raw) = raw else {
        return DEFAULT_PORT;
    };

    match parse_port(raw) {
        Ok(port) => port,
        Err(e) => {
            tracing::warn!("{}, using default port {}", e, DEFAULT_PORT);
            DEFAULT_PORT
        }
    }
}
