use anyhow::Result;
use async_trait::async_trait;
use url::Url;

/// Opens streaming connections to the analysis service
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Transport identifier used in logs (e.g., "websocket", "mock")
    fn transport_id(&self) -> &str;

    /// Establish a connection; an `Err` means the endpoint was unreachable
    async fn connect(&self, url: &Url) -> Result<Box<dyn StreamConnection>>;
}

/// One open connection delivering JSON text frames
#[async_trait]
pub trait StreamConnection: Send {
    /// Next inbound text frame.
    ///
    /// `Ok(None)` means the peer closed the connection cleanly; `Err` is a
    /// transport failure.
    async fn next_text(&mut self) -> Result<Option<String>>;

    /// Close from our side. Closing an already-closed connection is a no-op.
    async fn close(&mut self) -> Result<()>;
}
