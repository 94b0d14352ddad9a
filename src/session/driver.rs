use super::machine::SessionCore;
use super::state::SessionStatus;
use crate::buffers::StreamStats;
use crate::config::ClientConfig;
use crate::core::{now_millis, Sample};
use crate::observability::SessionMetrics;
use crate::transport::{StreamTransport, WebSocketTransport};
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Interval, MissedTickBehavior};
use url::Url;

/// How long teardown waits for a connection to close before aborting it
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Read-only view handed to the display layer after every update
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub stats: StreamStats,
    pub samples: Vec<Sample>,
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Start,
    Stop,
    Teardown,
}

struct CommandMsg {
    command: Command,
    ack: oneshot::Sender<()>,
}

#[derive(Debug)]
enum LinkEvent {
    Opened,
    Message(String),
    Closed,
    Error(String),
}

struct LinkMsg {
    generation: u64,
    event: LinkEvent,
}

/// One connection attempt and, if it succeeds, its reader
struct Link {
    generation: u64,
    close_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

/// Handle to a live-streaming session.
///
/// The session runs on its own tokio task, which owns the connection, the
/// fallback timer and the sample buffer. Commands are processed in order;
/// each `start`/`stop`/`teardown` returns once the session has applied it.
/// Dropping the handle tears the session down.
pub struct StreamingSession {
    commands: mpsc::UnboundedSender<CommandMsg>,
    snapshots: watch::Receiver<Arc<SessionSnapshot>>,
    metrics: Arc<SessionMetrics>,
    url: Url,
    task: JoinHandle<()>,
}

impl StreamingSession {
    /// Spawn a session talking to the configured service over `transport`.
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: &ClientConfig, transport: Arc<dyn StreamTransport>) -> Result<Self> {
        config.validate()?;
        let core = SessionCore::new(config.max_data_points, config.channel_count)?;
        Ok(Self::spawn_with_core(
            core,
            config.stream_url()?,
            config.fallback_interval(),
            transport,
        ))
    }

    /// Spawn a session over the WebSocket transport.
    pub fn websocket(config: &ClientConfig) -> Result<Self> {
        Self::spawn(config, Arc::new(WebSocketTransport::new()))
    }

    pub fn spawn_with_core(
        core: SessionCore,
        url: Url,
        fallback_interval: Duration,
        transport: Arc<dyn StreamTransport>,
    ) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (link_tx, link_rx) = mpsc::unbounded_channel();
        let metrics = core.metrics();
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(snapshot_of(&core)));

        let actor = SessionActor {
            core,
            url: url.clone(),
            fallback_interval,
            transport,
            link: None,
            generation: 0,
            link_tx,
            snapshots: snapshot_tx,
        };
        let task = tokio::spawn(actor.run(commands_rx, link_rx));

        Self {
            commands: commands_tx,
            snapshots: snapshot_rx,
            metrics,
            url,
            task,
        }
    }

    /// Start streaming, connecting first if there is no live connection.
    /// While no connection is up, synthetic samples fill the buffer.
    pub async fn start(&self) -> Result<()> {
        self.command(Command::Start).await
    }

    /// Pause streaming without closing the connection.
    pub async fn stop(&self) -> Result<()> {
        self.command(Command::Stop).await
    }

    /// Close the connection and stop streaming. Safe to call repeatedly.
    pub async fn teardown(&self) {
        // A session whose task is gone is already torn down.
        let _ = self.command(Command::Teardown).await;
    }

    /// Tear down and wait for the session task to finish.
    pub async fn shutdown(self) -> Result<()> {
        self.teardown().await;
        let Self { commands, task, .. } = self;
        drop(commands);
        task.await?;
        Ok(())
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.snapshots.borrow().status.clone()
    }

    pub fn stats(&self) -> StreamStats {
        self.snapshots.borrow().stats
    }

    /// Receiver notified on every update; for chart consumers.
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionSnapshot>> {
        self.snapshots.clone()
    }

    pub fn metrics(&self) -> Arc<SessionMetrics> {
        self.metrics.clone()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn command(&self, command: Command) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.commands
            .send(CommandMsg { command, ack })
            .map_err(|_| anyhow!("streaming session has shut down"))?;
        done.await
            .map_err(|_| anyhow!("streaming session has shut down"))
    }
}

fn snapshot_of(core: &SessionCore) -> SessionSnapshot {
    SessionSnapshot {
        status: core.status(),
        stats: core.stats(),
        samples: core.buffer().snapshot(),
    }
}

struct SessionActor {
    core: SessionCore,
    url: Url,
    fallback_interval: Duration,
    transport: Arc<dyn StreamTransport>,
    link: Option<Link>,
    generation: u64,
    link_tx: mpsc::UnboundedSender<LinkMsg>,
    snapshots: watch::Sender<Arc<SessionSnapshot>>,
}

impl SessionActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<CommandMsg>,
        mut links: mpsc::UnboundedReceiver<LinkMsg>,
    ) {
        let mut ticker: Option<Interval> = None;

        loop {
            if self.core.fallback_active() {
                if ticker.is_none() {
                    let mut interval = time::interval(self.fallback_interval);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    ticker = Some(interval);
                }
            } else {
                ticker = None;
            }

            tokio::select! {
                msg = commands.recv() => match msg {
                    Some(CommandMsg { command, ack }) => {
                        self.handle_command(command).await;
                        self.publish();
                        let _ = ack.send(());
                    }
                    None => {
                        self.teardown().await;
                        break;
                    }
                },
                Some(msg) = links.recv() => {
                    self.handle_link(msg);
                    self.publish();
                }
                _ = next_tick(&mut ticker) => {
                    if self.core.on_tick(now_millis()) {
                        self.publish();
                    }
                }
            }
        }

        log::debug!("streaming session for {} finished", self.url);
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start => {
                if self.core.start() {
                    self.open_link();
                }
            }
            Command::Stop => self.core.stop(),
            Command::Teardown => self.teardown().await,
        }
    }

    fn handle_link(&mut self, msg: LinkMsg) {
        if self.link.as_ref().map(|l| l.generation) != Some(msg.generation) {
            log::debug!("ignoring event from superseded connection #{}", msg.generation);
            return;
        }
        match msg.event {
            LinkEvent::Opened => {
                log::info!("stream connected to {}", self.url);
                self.core.on_connection_opened();
            }
            LinkEvent::Message(text) => self.core.on_sample_batch(&text, now_millis()),
            LinkEvent::Closed => {
                log::info!("stream closed by {}", self.url);
                self.link = None;
                self.core.on_connection_closed();
            }
            LinkEvent::Error(err) => {
                log::warn!("stream unavailable, showing demo data: {}", err);
                self.link = None;
                self.core.on_connection_error(err);
            }
        }
    }

    fn open_link(&mut self) {
        if let Some(mut old) = self.link.take() {
            if let Some(tx) = old.close_tx.take() {
                let _ = tx.send(());
            }
        }
        self.generation += 1;
        let (close_tx, close_rx) = oneshot::channel();
        log::info!(
            "connecting to {} via {} (#{})",
            self.url,
            self.transport.transport_id(),
            self.generation
        );
        let handle = tokio::spawn(run_link(
            self.transport.clone(),
            self.url.clone(),
            self.generation,
            self.link_tx.clone(),
            close_rx,
        ));
        self.link = Some(Link {
            generation: self.generation,
            close_tx: Some(close_tx),
            handle,
        });
    }

    async fn teardown(&mut self) {
        if self.core.teardown() {
            log::info!("closing stream to {}", self.url);
        }
        if let Some(mut link) = self.link.take() {
            if let Some(tx) = link.close_tx.take() {
                let _ = tx.send(());
            }
            if time::timeout(CLOSE_GRACE, &mut link.handle).await.is_err() {
                link.handle.abort();
            }
        }
        // Anything still queued from the closed link is stale now.
        self.generation += 1;
    }

    fn publish(&self) {
        self.snapshots.send_replace(Arc::new(snapshot_of(&self.core)));
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Connect, then forward frames until the peer closes, the transport fails,
/// or the session asks us to close.
async fn run_link(
    transport: Arc<dyn StreamTransport>,
    url: Url,
    generation: u64,
    events: mpsc::UnboundedSender<LinkMsg>,
    mut close_rx: oneshot::Receiver<()>,
) {
    let send = |event: LinkEvent| events.send(LinkMsg { generation, event }).is_ok();

    let connected = tokio::select! {
        _ = &mut close_rx => return,
        result = transport.connect(&url) => result,
    };
    let mut conn = match connected {
        Ok(conn) => conn,
        Err(e) => {
            send(LinkEvent::Error(format!("{:#}", e)));
            return;
        }
    };

    if send(LinkEvent::Opened) {
        loop {
            tokio::select! {
                _ = &mut close_rx => break,
                next = conn.next_text() => match next {
                    Ok(Some(text)) => {
                        if !send(LinkEvent::Message(text)) {
                            break;
                        }
                    }
                    Ok(None) => {
                        send(LinkEvent::Closed);
                        return;
                    }
                    Err(e) => {
                        send(LinkEvent::Error(format!("{:#}", e)));
                        return;
                    }
                },
            }
        }
    }

    if let Err(e) = conn.close().await {
        log::debug!("error closing stream #{}: {:#}", generation, e);
    }
}
