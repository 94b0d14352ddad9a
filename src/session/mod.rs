pub mod batch;
pub mod driver;
pub mod machine;
pub mod state;

pub use driver::{SessionSnapshot, StreamingSession};
pub use machine::SessionCore;
pub use state::{ConnectionState, SessionStatus};
