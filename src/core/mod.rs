pub mod sample;

pub use sample::{now_millis, Sample};
