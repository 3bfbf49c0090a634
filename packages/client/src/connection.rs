//! Connection to a relay server.

use std::sync::Arc;

use futures_util::SinkExt;
use relaychat_shared::protocol::{Message, MessageCodec};
use tokio::{
    net::{TcpStream, tcp::OwnedWriteHalf},
    sync::Mutex,
    task::JoinHandle,
};
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::{
    config::ClientConfig,
    error::ClientError,
    listener::{ConnectionState, listen},
    output::OutputHandler,
};

type Writer = FramedWrite<OwnedWriteHalf, MessageCodec>;

/// Manages all communication with the server.
///
/// Sends are awaited by the caller; broadcasts from the server are delivered
/// by a background listener task to the [`OutputHandler`] given to
/// [`ServerConnection::connect`].
pub struct ServerConnection {
    peer: String,
    writer: Mutex<Option<Writer>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    state: Arc<ConnectionState>,
    config: ClientConfig,
}

impl ServerConnection {
    /// Connect to `host:port` with the default timeouts and start the listener.
    pub async fn connect<O>(host: &str, port: u16, output: O) -> Result<Self, ClientError>
    where
        O: OutputHandler + 'static,
    {
        Self::connect_with_config(host, port, output, ClientConfig::default()).await
    }

    /// Connect to `host:port` and start the listener.
    ///
    /// # Errors
    ///
    /// [`ClientError::Timeout`] if the connection is not established within
    /// `config.connect_timeout`, [`ClientError::ConnectionError`] if it is refused.
    pub async fn connect_with_config<O>(
        host: &str,
        port: u16,
        output: O,
        config: ClientConfig,
    ) -> Result<Self, ClientError>
    where
        O: OutputHandler + 'static,
    {
        let peer = format!("{host}:{port}");

        let stream = match tokio::time::timeout(
            config.connect_timeout,
            TcpStream::connect((host, port)),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(ClientError::ConnectionError(e.to_string())),
            Err(_) => return Err(ClientError::Timeout(peer)),
        };
        stream
            .set_nodelay(true)
            .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

        let (read_half, write_half) = stream.into_split();
        let state = Arc::new(ConnectionState::new());
        let output: Arc<dyn OutputHandler> = Arc::new(output);

        let listener = tokio::spawn(listen(
            FramedRead::new(read_half, MessageCodec::new()),
            output,
            Arc::clone(&state),
            config.read_timeout,
        ));

        tracing::info!("Connected to chat server at {}", peer);

        Ok(Self {
            peer,
            writer: Mutex::new(Some(FramedWrite::new(write_half, MessageCodec::new()))),
            listener: Mutex::new(Some(listener)),
            state,
            config,
        })
    }

    /// Tell the server the user's name. It is prepended to every later entry
    /// until a new name is sent.
    pub async fn send_username(&self, username: &str) -> Result<(), ClientError> {
        self.send(Message::User(username.to_string())).await
    }

    /// Send a chat entry; the server broadcasts it to all clients, this one included.
    pub async fn send_entry(&self, text: &str) -> Result<(), ClientError> {
        self.send(Message::Entry(text.to_string())).await
    }

    /// Send `DISCONNECT`, close the connection and wait for the listener to stop.
    ///
    /// Calling it again after the first call is a no-op.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        if self.state.begin_closing() {
            return Ok(());
        }

        let result = {
            let mut writer = self.writer.lock().await;
            let result = match writer.as_mut() {
                Some(w) if self.state.has_live_stream() => w
                    .send(Message::Disconnect)
                    .await
                    .map_err(ClientError::from),
                _ => Ok(()),
            };
            if let Some(mut w) = writer.take()
                && let Err(e) = SinkExt::<Message>::close(&mut w).await
            {
                tracing::debug!("Failed to shut down connection to {}: {}", self.peer, e);
            }
            result
        };

        self.stop_listener().await;
        tracing::info!("Disconnected from {}", self.peer);
        result
    }

    /// `true` until `disconnect` is called or the listener observes the
    /// connection ending.
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    async fn send(&self, message: Message) -> Result<(), ClientError> {
        if !self.state.is_connected() {
            return Err(ClientError::NotConnected);
        }

        let mut writer = self.writer.lock().await;
        let writer = writer.as_mut().ok_or(ClientError::NotConnected)?;
        tracing::debug!("Sending {} to {}", message.kind(), self.peer);
        writer.send(message).await?;
        Ok(())
    }

    async fn stop_listener(&self) {
        let Some(mut handle) = self.listener.lock().await.take() else {
            return;
        };
        if tokio::time::timeout(self.config.teardown_timeout, &mut handle)
            .await
            .is_err()
        {
            tracing::warn!("Listener did not stop in time, aborting it");
            handle.abort();
        }
    }
}

impl Drop for ServerConnection {
    fn drop(&mut self) {
        self.state.begin_closing();
        if let Some(handle) = self.listener.get_mut().take() {
            handle.abort();
        }
    }
}
