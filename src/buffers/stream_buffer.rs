use crate::core::Sample;
use crate::error::ConfigError;
use serde::Serialize;
use std::collections::VecDeque;

/// Derived readings the display layer shows next to the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StreamStats {
    pub sampling_rate_hz: u32,
    pub channel_count: usize,
    pub buffer_size: usize,
}

/// Rolling window of the most recent samples, oldest first.
///
/// Holds at most `capacity` samples; pushing into a full buffer evicts the
/// oldest one. Timestamps never go backwards: a sample stamped earlier than
/// its predecessor is clamped to the predecessor's timestamp.
#[derive(Debug, Clone)]
pub struct StreamBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl StreamBuffer {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::Zero { field: "max_data_points" });
        }
        Ok(Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Append a sample, returning the evicted one if the buffer was full.
    pub fn push(&mut self, mut sample: Sample) -> Option<Sample> {
        if let Some(last) = self.samples.back() {
            sample.timestamp = sample.timestamp.max(last.timestamp);
        }
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Owned copy for readers, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().cloned().collect()
    }

    /// `round(1000 / Δt)` over the two newest samples, with Δt floored at 1 ms.
    pub fn sampling_rate_hz(&self) -> u32 {
        let n = self.samples.len();
        if n < 2 {
            return 0;
        }
        let delta = self.samples[n - 1]
            .timestamp
            .saturating_sub(self.samples[n - 2].timestamp)
            .max(1);
        (1000.0 / delta as f64).round() as u32
    }

    pub fn channel_count(&self) -> usize {
        self.latest().map(Sample::channel_count).unwrap_or(0)
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            sampling_rate_hz: self.sampling_rate_hz(),
            channel_count: self.channel_count(),
            buffer_size: self.len(),
        }
    }
}
