//! End-to-end tests: an in-process relay server driven by the real client library.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use relaychat_client::ServerConnection;
use relaychat_server::{Server, config::ServerConfig, relay::RelayServer};
use relaychat_shared::protocol::{Message, MessageCodec};
use tokio::{
    io::AsyncWriteExt,
    net::TcpStream,
    sync::mpsc::{self, UnboundedReceiver},
};
use tokio_util::codec::Framed;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Helper struct to manage an in-process server for one test
struct TestServer {
    addr: SocketAddr,
    relay: Arc<RelayServer>,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let server = Server::bind(ServerConfig::new("127.0.0.1", 0))
            .await
            .expect("Failed to bind test server");
        let addr = server.local_addr().expect("Failed to read local address");
        let relay = server.relay();
        let task = tokio::spawn(async move {
            server.serve().await.ok();
        });
        TestServer { addr, relay, task }
    }

    /// Connect a client and return it together with its output.
    async fn client(&self) -> TestClient {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = ServerConnection::connect("127.0.0.1", self.addr.port(), tx)
            .await
            .expect("Failed to connect client");
        TestClient {
            connection,
            output: rx,
        }
    }

    /// Wait until the live set reaches `expected` handlers.
    async fn wait_for_live_count(&self, expected: usize) {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        while self.relay.live_count().await != expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "live count never reached {expected}"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct TestClient {
    connection: ServerConnection,
    output: UnboundedReceiver<String>,
}

impl TestClient {
    async fn next_output(&mut self) -> String {
        tokio::time::timeout(RECV_TIMEOUT, self.output.recv())
            .await
            .expect("Timed out waiting for client output")
            .expect("Client output closed")
    }

    /// Assert that nothing more arrives within a short grace period.
    async fn assert_silent(&mut self) {
        let extra = tokio::time::timeout(Duration::from_millis(200), self.output.recv()).await;
        assert!(
            !matches!(extra, Ok(Some(_))),
            "unexpected output: {:?}",
            extra
        );
    }
}

#[tokio::test]
async fn test_join_is_broadcast_to_everyone_including_self() {
    // テスト項目: USER を送ると送信者を含む全クライアントに参加通知が届く (シナリオ A)
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.client().await;
    let mut bob = server.client().await;
    server.wait_for_live_count(2).await;

    // when (操作):
    alice.connection.send_username("alice").await.unwrap();

    // then (期待する結果):
    assert_eq!(alice.next_output().await, "alice joined conversation.");
    assert_eq!(bob.next_output().await, "alice joined conversation.");
}

#[tokio::test]
async fn test_entry_is_broadcast_and_logged_in_order() {
    // テスト項目: ENTRY が "<name>: <text>" として全員に届き、ログに参加通知→発言の順で残る (シナリオ B)
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.client().await;
    let mut bob = server.client().await;
    server.wait_for_live_count(2).await;
    alice.connection.send_username("alice").await.unwrap();
    alice.next_output().await;
    bob.next_output().await;

    // when (操作):
    alice.connection.send_entry("hello").await.unwrap();

    // then (期待する結果):
    assert_eq!(alice.next_output().await, "alice: hello");
    assert_eq!(bob.next_output().await, "alice: hello");
    assert_eq!(
        server.relay.history(),
        vec!["alice joined conversation.", "alice: hello"]
    );
}

#[tokio::test]
async fn test_newcomer_receives_replay_before_live_broadcasts() {
    // テスト項目: 後から参加したクライアントは既存の会話を順番に再生され、その後にライブのブロードキャストを受け取る (シナリオ C)
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.client().await;
    alice.connection.send_username("alice").await.unwrap();
    alice.connection.send_entry("hello").await.unwrap();
    alice.next_output().await;
    alice.next_output().await;

    // when (操作):
    let mut carol = server.client().await;
    server.wait_for_live_count(2).await;
    alice.connection.send_entry("welcome").await.unwrap();

    // then (期待する結果):
    assert_eq!(carol.next_output().await, "alice joined conversation.");
    assert_eq!(carol.next_output().await, "alice: hello");
    assert_eq!(carol.next_output().await, "alice: welcome");
}

#[tokio::test]
async fn test_disconnect_announces_leave_to_remaining_clients() {
    // テスト項目: DISCONNECT で退出通知が残りのクライアントに届き、以降のブロードキャストは退出者に送られずサーバーもエラーにならない (シナリオ D)
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.client().await;
    let mut bob = server.client().await;
    server.wait_for_live_count(2).await;
    alice.connection.send_username("alice").await.unwrap();
    bob.connection.send_username("bob").await.unwrap();
    for _ in 0..2 {
        alice.next_output().await;
        bob.next_output().await;
    }

    // when (操作):
    alice.connection.disconnect().await.unwrap();
    server.wait_for_live_count(1).await;
    bob.connection.send_entry("still here").await.unwrap();

    // then (期待する結果):
    assert_eq!(bob.next_output().await, "alice left conversation.");
    assert_eq!(bob.next_output().await, "bob: still here");
    alice.assert_silent().await;
    assert!(!alice.connection.is_connected());
    assert!(!server.task.is_finished());
}

#[tokio::test]
async fn test_disconnect_before_user_leaves_as_anonymous() {
    // テスト項目: USER を送らずに切断すると退出通知にデフォルト名が使われる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut watcher = server.client().await;
    let quiet = server.client().await;
    server.wait_for_live_count(2).await;

    // when (操作):
    quiet.connection.disconnect().await.unwrap();

    // then (期待する結果):
    assert_eq!(watcher.next_output().await, "anonymous left conversation.");
}

#[tokio::test]
async fn test_corrupt_message_only_drops_the_offender() {
    // テスト項目: 不正なメッセージを送ったクライアントだけが切断され、他のクライアントは通常通りやり取りできる (シナリオ E)
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.client().await;
    let mut bob = server.client().await;
    let mut rogue = TcpStream::connect(server.addr).await.unwrap();
    server.wait_for_live_count(3).await;

    // when (操作):
    let payload = br#"{"kind":"SHOUT","body":"!!!"}"#;
    rogue
        .write_all(&(payload.len() as u32).to_be_bytes())
        .await
        .unwrap();
    rogue.write_all(payload).await.unwrap();
    server.wait_for_live_count(2).await;
    alice.connection.send_entry("anyone there?").await.unwrap();

    // then (期待する結果):
    assert_eq!(alice.next_output().await, "anonymous: anyone there?");
    assert_eq!(bob.next_output().await, "anonymous: anyone there?");
    assert_eq!(server.relay.history(), vec!["anonymous: anyone there?"]);
}

#[tokio::test]
async fn test_spoofed_broadcast_from_client_is_rejected() {
    // テスト項目: クライアントが BROADCAST を送ると接続が切られ、他のクライアントには何も届かない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.client().await;
    let stream = TcpStream::connect(server.addr).await.unwrap();
    let mut rogue = Framed::new(stream, MessageCodec::new());
    server.wait_for_live_count(2).await;

    // when (操作):
    rogue
        .send(Message::Broadcast("server says hi".to_string()))
        .await
        .unwrap();

    // then (期待する結果):
    server.wait_for_live_count(1).await;
    assert!(rogue.next().await.is_none());
    alice.assert_silent().await;
}
