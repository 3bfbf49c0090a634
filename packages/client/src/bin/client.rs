//! Interactive chat client for a relaychat server.
//!
//! Reads lines from the terminal and interprets them:
//!
//! - `connect <host> <port>` connects to a server
//! - `user <name>` sets the name prepended to your entries
//! - `quit` leaves the conversation and exits
//! - anything else is sent as a chat entry
//!
//! Run with:
//! ```not_rust
//! cargo run --bin relaychat-client
//! cargo run --bin relaychat-client -- --host 127.0.0.1 --port 8080 --username alice
//! ```

use std::sync::Arc;

use clap::Parser;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use relaychat_client::{
    command::{Command, CommandError, parse_command},
    session::{Flow, Session},
    ui::{ConsoleOutput, PROMPT, redisplay_prompt},
};
use relaychat_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "relaychat-client")]
#[command(about = "Interactive client for the relaychat chat relay", long_about = None)]
struct Args {
    /// Server to connect to at startup
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Server port used with --host
    #[arg(short = 'p', long, default_value_t = 8080)]
    port: u16,

    /// Username to send right after connecting
    #[arg(short = 'u', long, requires = "host")]
    username: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();
    let mut session = Session::new(Arc::new(ConsoleOutput));

    if let Some(host) = args.host {
        let mut startup = vec![Command::Connect {
            host,
            port: args.port,
        }];
        startup.extend(args.username.map(Command::User));
        for command in startup {
            if let Err(e) = session.execute(command).await {
                tracing::warn!("Startup command failed: {}", e);
                println!("Operation failed");
                break;
            }
        }
    }

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let _readline_handle = std::thread::spawn(move || read_lines(input_tx));

    while let Some(line) = input_rx.recv().await {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(e) => {
                println!("{e}");
                redisplay_prompt();
                continue;
            }
        };

        match session.execute(command).await {
            Ok(Flow::Quit) => return,
            Ok(Flow::Continue) => {}
            Err(e) => {
                tracing::warn!("Command failed: {}", e);
                println!("Operation failed");
                redisplay_prompt();
            }
        }
    }

    // Input closed (Ctrl+C / Ctrl+D)
    if let Err(e) = session.close().await {
        tracing::warn!("Failed to disconnect cleanly: {}", e);
    }
}

fn read_lines(input_tx: mpsc::UnboundedSender<String>) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to initialize readline: {}", e);
            return;
        }
    };

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    rl.add_history_entry(line).ok();
                    if input_tx.send(line.to_string()).is_err() {
                        // Channel closed, exit thread
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                tracing::error!("Readline error: {}", err);
                break;
            }
        }
    }
}
