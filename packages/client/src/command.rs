//! Parsing of interactive client input lines.

use thiserror::Error;

/// One line of user input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `connect <host> <port>`
    Connect { host: String, port: u16 },
    /// `user <name>`
    User(String),
    /// `quit`
    Quit,
    /// Anything else is sent to the conversation as-is
    Entry(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Nothing to send")]
    Empty,

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid port number '{0}'")]
    InvalidPort(String),
}

/// Parse a line typed by the user. Command words are case-insensitive.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(CommandError::Empty);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "connect" => {
            let mut params = rest.split_whitespace();
            let (Some(host), Some(port), None) = (params.next(), params.next(), params.next())
            else {
                return Err(CommandError::Usage("connect <host> <port>"));
            };
            let port = port
                .parse::<u16>()
                .map_err(|_| CommandError::InvalidPort(port.to_string()))?;
            Ok(Command::Connect {
                host: host.to_string(),
                port,
            })
        }
        "user" if rest.is_empty() => Err(CommandError::Usage("user <name>")),
        "user" => Ok(Command::User(rest.to_string())),
        "quit" => Ok(Command::Quit),
        _ => Ok(Command::Entry(line.to_string())),
    }
}
