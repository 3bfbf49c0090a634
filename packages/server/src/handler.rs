//! Per-connection handler: replays the conversation, then drives the
//! participant state machine from inbound messages while forwarding
//! broadcasts to the client.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use relaychat_shared::protocol::{Message, MessageCodec, ProtocolError};
use tokio::{net::TcpStream, sync::mpsc, time::Instant};
use tokio_util::codec::Framed;

use crate::{
    domain::{Participant, Transition},
    relay::{HandlerId, RelayServer},
};

type Connection = Framed<TcpStream, MessageCodec>;

/// Why a handler stopped.
#[derive(Debug)]
enum Outcome {
    /// Client sent `DISCONNECT`; carries the leave notice to broadcast
    Left(String),
    /// Client broke the protocol
    Violation(String),
    /// Read or write failed, or the peer closed the socket
    ConnectionLost(String),
    /// Nothing received within the idle timeout
    TimedOut,
}

/// Handles all communication with one connected client.
pub struct ConnectionHandler {
    relay: Arc<RelayServer>,
    peer: SocketAddr,
    idle_timeout: Duration,
    participant: Participant,
}

impl ConnectionHandler {
    pub fn new(relay: Arc<RelayServer>, peer: SocketAddr, idle_timeout: Duration) -> Self {
        Self {
            relay,
            peer,
            idle_timeout,
            participant: Participant::new(),
        }
    }

    /// Run the handler until the client leaves or the connection fails.
    pub async fn run(mut self, stream: TcpStream) {
        let mut connection = Framed::new(stream, MessageCodec::new());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let (id, history) = self.relay.register_handler(tx).await;
        tracing::info!("Client {} connected as handler {}", self.peer, id);

        let outcome = self.serve(&mut connection, &mut rx, history).await;

        // Closed: close the socket before leaving the live set
        self.participant.close();
        release(connection);
        rx.close();
        self.relay.remove_handler(id).await;

        self.finish(id, outcome).await;
    }

    async fn serve(
        &mut self,
        connection: &mut Connection,
        rx: &mut mpsc::UnboundedReceiver<String>,
        history: Vec<String>,
    ) -> Outcome {
        for entry in history {
            if let Err(e) = connection.send(Message::Broadcast(entry)).await {
                return Outcome::ConnectionLost(e.to_string());
            }
        }
        self.participant.activate();

        let idle = tokio::time::sleep(self.idle_timeout);
        tokio::pin!(idle);

        loop {
            tokio::select! {
                frame = connection.next() => {
                    let message = match frame {
                        Some(Ok(message)) => message,
                        Some(Err(ProtocolError::CorruptMessage(reason))) => {
                            return Outcome::Violation(reason);
                        }
                        Some(Err(e)) => return Outcome::ConnectionLost(e.to_string()),
                        None => return Outcome::ConnectionLost("closed by peer".to_string()),
                    };
                    idle.as_mut().reset(Instant::now() + self.idle_timeout);

                    tracing::debug!("Received {} from {}", message.kind(), self.peer);
                    match self.participant.apply(message) {
                        Transition::Broadcast(text) => {
                            self.relay.broadcast(text).await;
                        }
                        Transition::Leave(notice) => return Outcome::Left(notice),
                        Transition::Violation(reason) => return Outcome::Violation(reason),
                    }
                }
                Some(text) = rx.recv() => {
                    if let Err(e) = connection.send(Message::Broadcast(text)).await {
                        return Outcome::ConnectionLost(e.to_string());
                    }
                }
                () = &mut idle => return Outcome::TimedOut,
            }
        }
    }

    async fn finish(&self, id: HandlerId, outcome: Outcome) {
        let username = self.participant.username();
        match outcome {
            Outcome::Left(notice) => {
                tracing::info!("Client {} ('{}') disconnected", self.peer, username);
                self.relay.broadcast(notice).await;
            }
            Outcome::Violation(reason) => {
                tracing::warn!(
                    "Dropping client {} (handler {}): received corrupt message: {}",
                    self.peer,
                    id,
                    reason
                );
            }
            Outcome::ConnectionLost(reason) => {
                tracing::warn!(
                    "Lost connection to client {} ('{}'): {}",
                    self.peer,
                    username,
                    reason
                );
            }
            Outcome::TimedOut => {
                tracing::warn!(
                    "Client {} ('{}') idle for {:?}, closing connection",
                    self.peer,
                    username,
                    self.idle_timeout
                );
            }
        }
    }
}

/// Close the socket on the blocking pool.
///
/// With linger set, closing a socket that still has queued output blocks the
/// calling thread until the data is flushed or the linger time runs out.
fn release(connection: Connection) {
    match connection.into_inner().into_std() {
        Ok(stream) => {
            tokio::task::spawn_blocking(move || drop(stream));
        }
        Err(e) => tracing::debug!("Failed to detach socket for closing: {}", e),
    }
}
