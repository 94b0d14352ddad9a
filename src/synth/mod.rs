pub mod generator;

pub use generator::SyntheticGenerator;
