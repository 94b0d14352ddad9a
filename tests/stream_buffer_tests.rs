use eegscope::buffers::StreamBuffer;
use eegscope::core::Sample;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_length_never_exceeds_capacity() {
    let mut rng = StdRng::seed_from_u64(2024);

    for capacity in [1usize, 2, 7, 100] {
        let mut buffer = StreamBuffer::new(capacity).unwrap();
        let mut ts = 0u64;

        for i in 0..(capacity * 3 + 5) {
            ts += rng.gen_range(0..250);
            let oldest = buffer.iter().next().cloned();
            let was_full = buffer.len() == capacity;

            let evicted = buffer.push(Sample::new(ts, vec![i as f64; 8]));

            assert!(buffer.len() <= capacity);
            if was_full {
                assert_eq!(evicted, oldest);
                assert_eq!(buffer.len(), capacity);
            } else {
                assert!(evicted.is_none());
            }
            assert_eq!(buffer.latest().unwrap().channels[0], i as f64);
        }
    }
}

#[test]
fn test_sampling_rate_uses_two_newest_samples() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut buffer = StreamBuffer::new(100).unwrap();
    let mut ts = 1_700_000_000_000u64;

    for _ in 0..500 {
        let prev = buffer.latest().map(|s| s.timestamp);
        ts += rng.gen_range(0..40);
        buffer.push(Sample::new(ts, vec![0.0; 8]));

        let expected = match prev {
            None => 0,
            Some(prev) => (1000.0 / (ts - prev).max(1) as f64).round() as u32,
        };
        assert_eq!(buffer.sampling_rate_hz(), expected);
    }
}

#[test]
fn test_snapshot_is_detached_copy() {
    let mut buffer = StreamBuffer::new(3).unwrap();
    buffer.push(Sample::new(1, vec![1.0]));
    let snapshot = buffer.snapshot();

    buffer.push(Sample::new(2, vec![2.0]));
    assert_eq!(snapshot.len(), 1);
    assert_eq!(buffer.len(), 2);
}
