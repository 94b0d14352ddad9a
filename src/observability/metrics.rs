use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one streaming session, shared with whoever displays them
#[derive(Debug, Default)]
pub struct SessionMetrics {
    live_samples: AtomicU64,
    synthetic_samples: AtomicU64,
    malformed_batches: AtomicU64,
    paused_batches: AtomicU64,
    connection_attempts: AtomicU64,
    connection_errors: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub live_samples: u64,
    pub synthetic_samples: u64,
    pub malformed_batches: u64,
    pub paused_batches: u64,
    pub connection_attempts: u64,
    pub connection_errors: u64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_live_sample(&self) {
        self.live_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_synthetic_sample(&self) {
        self.synthetic_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed_batch(&self) {
        self.malformed_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_paused_batch(&self) {
        self.paused_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_attempt(&self) {
        self.connection_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_error(&self) {
        self.connection_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            live_samples: self.live_samples.load(Ordering::Relaxed),
            synthetic_samples: self.synthetic_samples.load(Ordering::Relaxed),
            malformed_batches: self.malformed_batches.load(Ordering::Relaxed),
            paused_batches: self.paused_batches.load(Ordering::Relaxed),
            connection_attempts: self.connection_attempts.load(Ordering::Relaxed),
            connection_errors: self.connection_errors.load(Ordering::Relaxed),
        }
    }

    pub fn report(&self) -> String {
        let m = self.snapshot();
        format!(
            "=== Stream Metrics ===\n  Live samples: {}\n  Synthetic samples: {}\n  Malformed batches: {}\n  Dropped while paused: {}\n  Connections: {} attempt{}, {} error{}\n",
            m.live_samples,
            m.synthetic_samples,
            m.malformed_batches,
            m.paused_batches,
            m.connection_attempts,
            if m.connection_attempts == 1 { "" } else { "s" },
            m.connection_errors,
            if m.connection_errors == 1 { "" } else { "s" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_report() {
        let metrics = SessionMetrics::new();
        metrics.record_live_sample();
        metrics.record_live_sample();
        metrics.record_synthetic_sample();
        metrics.record_connection_attempt();
        metrics.record_connection_error();

        let snap = metrics.snapshot();
        assert_eq!(snap.live_samples, 2);
        assert_eq!(snap.synthetic_samples, 1);
        assert_eq!(snap.malformed_batches, 0);

        let report = metrics.report();
        assert!(report.contains("Live samples: 2"));
        assert!(report.contains("1 attempt, 1 error"));
    }
}
