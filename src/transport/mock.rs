use super::{StreamConnection, StreamTransport};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use url::Url;

#[derive(Debug)]
enum MockFrame {
    Text(String),
    Error(String),
}

enum ConnectOutcome {
    Refuse(String),
    Accept {
        frames: mpsc::UnboundedReceiver<MockFrame>,
        closed_by_client: Arc<AtomicBool>,
    },
}

/// In-memory transport scripted by tests.
///
/// Each call to `connect` consumes the next scripted outcome; with nothing
/// scripted the connection is refused.
#[derive(Default)]
pub struct MockTransport {
    outcomes: Mutex<VecDeque<ConnectOutcome>>,
    attempts: AtomicUsize,
    last_url: Mutex<Option<Url>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script the next attempt to fail with `reason`.
    pub fn refuse_next(&self, reason: impl Into<String>) {
        self.push(ConnectOutcome::Refuse(reason.into()));
    }

    /// Script the next attempt to succeed; the returned peer drives it.
    pub fn accept_next(&self) -> MockPeer {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed_by_client = Arc::new(AtomicBool::new(false));
        self.push(ConnectOutcome::Accept {
            frames: rx,
            closed_by_client: closed_by_client.clone(),
        });
        MockPeer {
            tx: Some(tx),
            closed_by_client,
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn last_url(&self) -> Option<Url> {
        self.last_url
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn push(&self, outcome: ConnectOutcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(outcome);
    }
}

#[async_trait]
impl StreamTransport for MockTransport {
    fn transport_id(&self) -> &str {
        "mock"
    }

    async fn connect(&self, url: &Url) -> Result<Box<dyn StreamConnection>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        *self
            .last_url
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(url.clone());

        let outcome = self
            .outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();

        match outcome {
            Some(ConnectOutcome::Accept {
                frames,
                closed_by_client,
            }) => Ok(Box::new(MockConnection {
                frames,
                closed_by_client,
            })),
            Some(ConnectOutcome::Refuse(reason)) => Err(anyhow!(reason)),
            None => Err(anyhow!("connection refused")),
        }
    }
}

struct MockConnection {
    frames: mpsc::UnboundedReceiver<MockFrame>,
    closed_by_client: Arc<AtomicBool>,
}

#[async_trait]
impl StreamConnection for MockConnection {
    async fn next_text(&mut self) -> Result<Option<String>> {
        match self.frames.recv().await {
            Some(MockFrame::Text(text)) => Ok(Some(text)),
            Some(MockFrame::Error(msg)) => Err(anyhow!(msg)),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.closed_by_client.store(true, Ordering::SeqCst);
        self.frames.close();
        Ok(())
    }
}

/// Server side of a scripted mock connection
pub struct MockPeer {
    tx: Option<mpsc::UnboundedSender<MockFrame>>,
    closed_by_client: Arc<AtomicBool>,
}

impl MockPeer {
    /// Deliver a text frame; returns false once the connection is gone.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        match &self.tx {
            Some(tx) => tx.send(MockFrame::Text(text.into())).is_ok(),
            None => false,
        }
    }

    /// Fail the connection mid-stream.
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        match &self.tx {
            Some(tx) => tx.send(MockFrame::Error(reason.into())).is_ok(),
            None => false,
        }
    }

    /// Close cleanly from the server side.
    pub fn close(&mut self) {
        self.tx = None;
    }

    /// Whether the client closed this connection.
    pub fn closed_by_client(&self) -> bool {
        self.closed_by_client.load(Ordering::SeqCst)
    }
}
