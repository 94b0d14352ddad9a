pub mod api;
pub mod app;
pub mod buffers;
pub mod config;
pub mod core;
pub mod error;
pub mod observability;
pub mod session;
pub mod synth;
pub mod transport;

pub use app::AppSession;
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError};
pub use session::{ConnectionState, SessionStatus, StreamingSession};
