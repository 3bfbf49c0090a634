//! Interactive client session: executes parsed commands against at most one
//! server connection.

use std::sync::Arc;

use crate::{
    command::Command, connection::ServerConnection, error::ClientError, output::OutputHandler,
};

/// Result of executing one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Holds the current connection, if any, and the output every connection reports to.
pub struct Session {
    output: Arc<dyn OutputHandler>,
    connection: Option<ServerConnection>,
}

impl Session {
    pub fn new(output: Arc<dyn OutputHandler>) -> Self {
        Self {
            output,
            connection: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(ServerConnection::is_connected)
    }

    /// Execute one command.
    ///
    /// `connect` replaces an existing connection; `quit` disconnects and asks
    /// the caller to stop.
    pub async fn execute(&mut self, command: Command) -> Result<Flow, ClientError> {
        match command {
            Command::Connect { host, port } => {
                self.close().await?;
                let connection =
                    ServerConnection::connect(&host, port, Arc::clone(&self.output)).await?;
                self.connection = Some(connection);
                self.output.handle_msg(&format!("Connected to {host}:{port}"));
            }
            Command::User(username) => self.current()?.send_username(&username).await?,
            Command::Entry(text) => self.current()?.send_entry(&text).await?,
            Command::Quit => {
                self.close().await?;
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Disconnect from the current server, if connected. Blocks until teardown completes.
    pub async fn close(&mut self) -> Result<(), ClientError> {
        match self.connection.take() {
            Some(connection) => connection.disconnect().await,
            None => Ok(()),
        }
    }

    fn current(&self) -> Result<&ServerConnection, ClientError> {
        self.connection.as_ref().ok_or(ClientError::NotConnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use relaychat_shared::protocol::{Message, MessageCodec};
    use tokio::{net::TcpListener, sync::mpsc};
    use tokio_util::codec::Framed;

    #[tokio::test]
    async fn test_entry_without_connection_fails() {
        // テスト項目: 未接続の状態で発言すると NotConnected エラーになる
        // given (前提条件):
        let (tx, _rx) = mpsc::unbounded_channel::<String>();
        let mut session = Session::new(Arc::new(tx));

        // when (操作):
        let result = session.execute(Command::Entry("hello".to_string())).await;

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::NotConnected)));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_connect_user_and_quit() {
        // テスト項目: connect → user → quit の順に実行すると、接続通知が出力され USER と DISCONNECT が送信される
        // given (前提条件):
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let mut session = Session::new(Arc::new(tx));
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut framed = Framed::new(stream, MessageCodec::new());
            let first = framed.next().await.unwrap().unwrap();
            let second = framed.next().await.unwrap().unwrap();
            (first, second)
        });

        // when (操作):
        let connected = session
            .execute(Command::Connect {
                host: "127.0.0.1".to_string(),
                port,
            })
            .await
            .unwrap();
        session
            .execute(Command::User("alice".to_string()))
            .await
            .unwrap();
        let quit = session.execute(Command::Quit).await.unwrap();

        // then (期待する結果):
        assert_eq!(connected, Flow::Continue);
        assert_eq!(quit, Flow::Quit);
        assert_eq!(
            rx.recv().await,
            Some(format!("Connected to 127.0.0.1:{port}"))
        );
        let (first, second) = server.await.unwrap();
        assert_eq!(first, Message::User("alice".to_string()));
        assert_eq!(second, Message::Disconnect);
        assert!(!session.is_connected());
    }
}
