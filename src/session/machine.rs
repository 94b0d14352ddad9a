use super::batch::first_channel_vector;
use super::state::{ConnectionState, SessionStatus};
use crate::buffers::{StreamBuffer, StreamStats};
use crate::core::Sample;
use crate::error::ConfigError;
use crate::observability::SessionMetrics;
use crate::synth::SyntheticGenerator;
use std::sync::Arc;

/// State machine behind a streaming session.
///
/// Every method runs to completion and performs no I/O; the caller is told
/// when a connection must be opened or closed.
pub struct SessionCore {
    connection: ConnectionState,
    streaming: bool,
    last_error: Option<String>,
    buffer: StreamBuffer,
    generator: SyntheticGenerator,
    metrics: Arc<SessionMetrics>,
}

impl SessionCore {
    pub fn new(capacity: usize, channel_count: usize) -> Result<Self, ConfigError> {
        Self::with_generator(capacity, SyntheticGenerator::new(channel_count))
    }

    pub fn with_generator(
        capacity: usize,
        generator: SyntheticGenerator,
    ) -> Result<Self, ConfigError> {
        if generator.channel_count() == 0 {
            return Err(ConfigError::Zero { field: "channel_count" });
        }
        Ok(Self {
            connection: ConnectionState::Disconnected,
            streaming: false,
            last_error: None,
            buffer: StreamBuffer::new(capacity)?,
            generator,
            metrics: Arc::new(SessionMetrics::new()),
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<SessionMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Begin streaming. Returns true when the caller must open a connection.
    pub fn start(&mut self) -> bool {
        if self.streaming {
            return false;
        }
        self.streaming = true;
        match self.connection {
            ConnectionState::Connected | ConnectionState::Connecting => false,
            ConnectionState::Disconnected | ConnectionState::Errored => {
                self.connection = ConnectionState::Connecting;
                self.metrics.record_connection_attempt();
                true
            }
        }
    }

    /// Pause streaming; any open connection stays open.
    pub fn stop(&mut self) {
        self.streaming = false;
    }

    /// Reset to disconnected. Returns true when a connection (or an attempt
    /// in flight) must be closed.
    pub fn teardown(&mut self) -> bool {
        let must_close = matches!(
            self.connection,
            ConnectionState::Connected | ConnectionState::Connecting
        );
        self.streaming = false;
        self.connection = ConnectionState::Disconnected;
        self.last_error = None;
        must_close
    }

    /// Inbound frame from the transport. Frames that cannot be read are
    /// replaced by noise so the chart keeps moving; frames arriving while
    /// paused are dropped.
    pub fn on_sample_batch(&mut self, raw: &str, now_ms: u64) {
        if !self.streaming {
            self.metrics.record_paused_batch();
            return;
        }
        let channels = match first_channel_vector(raw) {
            Some(channels) => {
                self.metrics.record_live_sample();
                channels
            }
            None => {
                log::debug!("malformed stream batch ({} bytes), synthesizing", raw.len());
                self.metrics.record_malformed_batch();
                let width = match self.buffer.channel_count() {
                    0 => self.generator.channel_count(),
                    n => n,
                };
                self.generator.noise_channels(width)
            }
        };
        self.buffer.push(Sample::new(now_ms, channels));
    }

    pub fn on_connection_opened(&mut self) {
        self.connection = ConnectionState::Connected;
        self.last_error = None;
    }

    /// The live connection dropped; streaming cannot continue on it.
    pub fn on_connection_closed(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.streaming = false;
    }

    /// Connection failed to open or broke mid-stream. Streaming is left
    /// as-is so the synthetic generator takes over.
    pub fn on_connection_error(&mut self, err: impl Into<String>) {
        self.connection = ConnectionState::Errored;
        self.last_error = Some(err.into());
        self.metrics.record_connection_error();
    }

    /// Fallback timer tick. Appends one synthetic sample when streaming
    /// without a live connection; returns whether it did.
    pub fn on_tick(&mut self, now_ms: u64) -> bool {
        if !self.fallback_active() {
            return false;
        }
        let sample = self.generator.next_sample(now_ms);
        self.buffer.push(sample);
        self.metrics.record_synthetic_sample();
        true
    }

    pub fn fallback_active(&self) -> bool {
        self.streaming && self.connection != ConnectionState::Connected
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            connection: self.connection,
            streaming: self.streaming,
            last_error: self.last_error.clone(),
        }
    }

    pub fn stats(&self) -> StreamStats {
        self.buffer.stats()
    }

    pub fn buffer(&self) -> &StreamBuffer {
        &self.buffer
    }

    pub fn metrics(&self) -> Arc<SessionMetrics> {
        self.metrics.clone()
    }
}
