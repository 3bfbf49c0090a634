//! Chat relay server.
//!
//! Broadcasts every chat entry to all connected clients and replays the
//! conversation so far to every newcomer.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin relaychat-server
//! cargo run --bin relaychat-server -- 9000
//! cargo run --bin relaychat-server -- --host 127.0.0.1 9000
//! ```

use clap::Parser;

use relaychat_server::{
    Server,
    config::{DEFAULT_HOST, ServerConfig, resolve_port},
    signal::shutdown_signal,
};
use relaychat_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "relaychat-server")]
#[command(about = "TCP chat relay server with conversation replay", long_about = None)]
struct Args {
    /// Port number to listen on (invalid values fall back to 8080)
    port: Option<String>,

    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let port = resolve_port(args.port.as_deref());
    let config = ServerConfig::new(args.host, port);

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Server failure: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.serve_with_shutdown(shutdown_signal()).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
