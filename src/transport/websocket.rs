use super::{StreamConnection, StreamTransport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

/// WebSocket transport for the live `/ws/stream` endpoint
#[derive(Debug, Clone, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StreamTransport for WebSocketTransport {
    fn transport_id(&self) -> &str {
        "websocket"
    }

    async fn connect(&self, url: &Url) -> Result<Box<dyn StreamConnection>> {
        let (ws, _response) = connect_async(url.as_str())
            .await
            .with_context(|| format!("Failed to connect to {}", url))?;
        Ok(Box::new(WebSocketConnection { ws, closed: false }))
    }
}

pub struct WebSocketConnection {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

#[async_trait]
impl StreamConnection for WebSocketConnection {
    async fn next_text(&mut self) -> Result<Option<String>> {
        if self.closed {
            return Ok(None);
        }
        loop {
            match self.ws.next().await {
                None | Some(Ok(Message::Close(_))) => {
                    self.closed = true;
                    return Ok(None);
                }
                Some(Ok(Message::Text(text))) => return Ok(Some(text.to_string())),
                Some(Ok(Message::Binary(bytes))) => {
                    // Binary frames carry the same JSON; invalid UTF-8 is
                    // left to the batch parser to reject.
                    return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()));
                }
                Some(Ok(_)) => continue, // ping/pong handled by tungstenite
                Some(Err(tungstenite::Error::ConnectionClosed)) => {
                    self.closed = true;
                    return Ok(None);
                }
                Some(Err(e)) => {
                    self.closed = true;
                    return Err(e).context("WebSocket read failed");
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.ws.close(None).await {
            Ok(())
            | Err(tungstenite::Error::ConnectionClosed)
            | Err(tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(e).context("Failed to close WebSocket"),
        }
    }
}
