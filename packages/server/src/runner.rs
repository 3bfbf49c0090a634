//! Server execution logic: bind, then accept connections forever.

use std::{io, net::SocketAddr, sync::Arc};

use tokio::net::{TcpListener, TcpStream};

use crate::{
    config::ServerConfig, error::ServerError, handler::ConnectionHandler, relay::RelayServer,
};

/// Chat relay server
///
/// # Example
///
/// ```ignore
/// let server = Server::bind(ServerConfig::new("0.0.0.0", 8080)).await?;
/// server.serve_with_shutdown(shutdown_signal()).await?;
/// ```
pub struct Server {
    listener: TcpListener,
    relay: Arc<RelayServer>,
    config: ServerConfig,
}

impl Server {
    /// Bind the listening endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound; this is
    /// the only failure that is fatal for the whole server.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Self {
            listener,
            relay: Arc::new(RelayServer::new()),
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(ServerError::LocalAddr)
    }

    /// Shared relay state, e.g. for inspecting the conversation.
    pub fn relay(&self) -> Arc<RelayServer> {
        Arc::clone(&self.relay)
    }

    /// Accept connections until the listener fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Accept connections until `signal` resolves or the listener fails.
    ///
    /// Handlers that are already running are left to finish on their own.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(signal);
        tracing::info!("Chat relay server listening on {}", self.local_addr()?);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => self.start_handler(stream, peer),
                    Err(e) if is_connection_error(&e) => {
                        tracing::warn!("Failed to accept connection: {}", e);
                    }
                    Err(e) => {
                        tracing::error!("Server failure: {}", e);
                        return Err(ServerError::Accept(e));
                    }
                },
                () = &mut signal => {
                    tracing::info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    fn start_handler(&self, stream: TcpStream, peer: SocketAddr) {
        if let Err(e) = configure_stream(&stream, &self.config) {
            tracing::warn!("Failed to configure connection from {}: {}", peer, e);
            return;
        }

        let handler = ConnectionHandler::new(self.relay(), peer, self.config.idle_timeout);
        tokio::spawn(handler.run(stream));
    }
}

#[allow(deprecated)]
fn configure_stream(stream: &TcpStream, config: &ServerConfig) -> io::Result<()> {
    stream.set_nodelay(true)?;
    stream.set_linger(Some(config.linger))?;
    Ok(())
}

/// Errors that concern one incoming connection rather than the listener.
fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}
