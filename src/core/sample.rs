use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// One instant of multi-channel EEG data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Arrival time in milliseconds since epoch
    pub timestamp: u64,

    /// Amplitudes in µV, one per channel
    pub channels: Vec<f64>,
}

impl Sample {
    pub fn new(timestamp: u64, channels: Vec<f64>) -> Self {
        Self { timestamp, channels }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

/// Wall-clock milliseconds since the Unix epoch.
///
/// A clock set before 1970 reads as 0 rather than failing.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_serializes_like_wire_format() {
        let sample = Sample::new(1_700_000_000_000, vec![1.0, -2.5]);
        let json = serde_json::to_value(&sample).unwrap();

        assert_eq!(json["timestamp"], 1_700_000_000_000u64);
        assert_eq!(json["channels"][1], -2.5);
        assert_eq!(sample.channel_count(), 2);
    }

    #[test]
    fn test_now_millis_is_recent() {
        // 2020-01-01 in ms
        assert!(now_millis() > 1_577_836_800_000);
    }
}
