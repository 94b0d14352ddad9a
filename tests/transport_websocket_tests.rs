use eegscope::session::SessionSnapshot;
use eegscope::transport::{StreamTransport, WebSocketTransport};
use eegscope::{ClientConfig, ConnectionState, StreamingSession};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

async fn wait_until(
    session: &StreamingSession,
    pred: impl Fn(&SessionSnapshot) -> bool,
) -> Arc<SessionSnapshot> {
    let mut rx = session.subscribe();
    timeout(Duration::from_secs(3), async move {
        rx.wait_for(|s| pred(s.as_ref()))
            .await
            .map(|snapshot| Arc::clone(&snapshot))
    })
    .await
    .expect("timed out waiting for session state")
    .expect("session task ended")
}

/// Accept one WebSocket client, send `frames`, then close when told to.
async fn serve_frames(frames: Vec<String>) -> (String, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (close_tx, close_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        for frame in frames {
            ws.send(Message::Text(frame.into())).await.unwrap();
        }
        let _ = close_rx.await;
        let _ = ws.close(None).await;
        while let Some(Ok(_)) = ws.next().await {}
    });

    (format!("http://{}", addr), close_tx)
}

#[tokio::test]
async fn test_transport_reads_text_frames_until_close() {
    let (base, close_tx) = serve_frames(vec!["[[1.5]]".to_string()]).await;
    let url = Url::parse(&base.replace("http", "ws")).unwrap();

    let transport = WebSocketTransport::new();
    let mut conn = transport.connect(&url).await.unwrap();
    assert_eq!(conn.next_text().await.unwrap().as_deref(), Some("[[1.5]]"));

    close_tx.send(()).unwrap();
    assert_eq!(conn.next_text().await.unwrap(), None);
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_transport_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("ws://{}/ws/stream", addr)).unwrap();
    assert!(WebSocketTransport::new().connect(&url).await.is_err());
}

#[tokio::test]
async fn test_secure_stream_url_attempts_tls_handshake() {
    // a plain TCP server that answers the TLS hello with garbage
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let _ = socket.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n").await;
    });

    let config = ClientConfig {
        base_url: format!("https://{}", addr),
        ..ClientConfig::default()
    };
    let url = config.stream_url().unwrap();
    assert_eq!(url.scheme(), "wss");

    let err = timeout(Duration::from_secs(5), WebSocketTransport::new().connect(&url))
        .await
        .expect("TLS handshake hung")
        .err()
        .expect("handshake against a plain TCP server must fail");
    let message = format!("{:#}", err);
    assert!(!message.contains("TLS support not compiled in"), "{}", message);
}

#[tokio::test]
async fn test_live_stream_end_to_end() {
    let (base, close_tx) =
        serve_frames(vec![r#"{"channels":[[1,2,3,4,5,6,7,8]]}"#.to_string()]).await;
    let config = ClientConfig {
        base_url: base,
        ..ClientConfig::default()
    };
    let session = StreamingSession::websocket(&config).unwrap();

    session.start().await.unwrap();
    let snapshot = wait_until(&session, |s| {
        s.samples
            .iter()
            .any(|x| x.channels == vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])
    })
    .await;
    assert_eq!(snapshot.status.connection, ConnectionState::Connected);
    assert!(snapshot.status.streaming);

    // server going away ends the stream
    close_tx.send(()).unwrap();
    let snapshot = wait_until(&session, |s| s.status.connection == ConnectionState::Disconnected).await;
    assert!(!snapshot.status.streaming);

    session.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_service_enters_demo_mode() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig {
        base_url: format!("http://{}", addr),
        ..ClientConfig::default()
    };
    let session = StreamingSession::websocket(&config).unwrap();

    session.start().await.unwrap();
    let snapshot = wait_until(&session, |s| s.status.connection == ConnectionState::Errored).await;
    assert!(snapshot.status.demo_mode());

    let snapshot = wait_until(&session, |s| s.samples.len() >= 4).await;
    assert!(snapshot.samples.iter().all(|s| s.channels.len() == 8));

    session.teardown().await;
    assert_eq!(session.status().connection, ConnectionState::Disconnected);
    session.shutdown().await.unwrap();
}
