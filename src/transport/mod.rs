pub mod traits;
pub mod websocket;
pub mod mock;

pub use traits::{StreamConnection, StreamTransport};
pub use websocket::WebSocketTransport;
