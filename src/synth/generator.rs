use crate::core::Sample;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Amplitude of the shared sine carrier, µV
const CARRIER_UV: f64 = 50.0;
/// Half-width of the per-channel jitter, µV
const JITTER_UV: f64 = 10.0;
/// Half-width of the noise used to patch malformed batches, µV
const NOISE_UV: f64 = 50.0;

/// Local stand-in for the live feed while no backend is connected.
pub struct SyntheticGenerator {
    channel_count: usize,
    rng: StdRng,
}

impl SyntheticGenerator {
    pub fn new(channel_count: usize) -> Self {
        Self {
            channel_count,
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible generator for tests.
    pub fn with_seed(channel_count: usize, seed: u64) -> Self {
        Self {
            channel_count,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// One demo-mode sample: every channel rides `sin(t / 1000) * 50` plus
    /// uniform jitter in `[-10, 10)`.
    pub fn next_sample(&mut self, now_ms: u64) -> Sample {
        let carrier = (now_ms as f64 / 1000.0).sin() * CARRIER_UV;
        let channels = (0..self.channel_count)
            .map(|_| carrier + self.rng.gen_range(-JITTER_UV..JITTER_UV))
            .collect();
        Sample::new(now_ms, channels)
    }

    /// `count` values of uniform noise in `[-50, 50)`, standing in for a
    /// batch row that could not be read.
    pub fn noise_channels(&mut self, count: usize) -> Vec<f64> {
        (0..count)
            .map(|_| self.rng.gen_range(-NOISE_UV..NOISE_UV))
            .collect()
    }
}
