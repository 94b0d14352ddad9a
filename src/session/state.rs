use serde::{Deserialize, Serialize};

/// Connection lifecycle of a streaming session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Errored,
}

impl ConnectionState {
    /// Get human-readable state name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Errored => "Errored",
        }
    }
}

/// What the display layer needs to draw the status bar.
///
/// Connection state and `streaming` are independent: a session can be
/// connected but paused, or streaming synthetic data while disconnected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SessionStatus {
    pub connection: ConnectionState,
    pub streaming: bool,
    pub last_error: Option<String>,
}

impl SessionStatus {
    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    /// Streaming without a live connection, i.e. showing synthetic data.
    pub fn demo_mode(&self) -> bool {
        self.streaming && !self.is_connected()
    }

    /// Non-blocking notice shown while in demo mode.
    pub fn notice(&self) -> Option<String> {
        if !self.demo_mode() {
            return None;
        }
        Some(match &self.last_error {
            Some(err) => format!("Demo mode: showing simulated EEG data ({})", err),
            None => "Demo mode: showing simulated EEG data".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_mode_only_while_streaming_unconnected() {
        let mut status = SessionStatus::default();
        assert!(!status.demo_mode());
        assert!(status.notice().is_none());

        status.streaming = true;
        assert!(status.demo_mode());

        status.connection = ConnectionState::Connected;
        assert!(!status.demo_mode());

        status.connection = ConnectionState::Errored;
        status.last_error = Some("connection refused".to_string());
        assert_eq!(
            status.notice().unwrap(),
            "Demo mode: showing simulated EEG data (connection refused)"
        );
    }

    #[test]
    fn test_state_names() {
        assert_eq!(ConnectionState::default().name(), "Disconnected");
        assert_eq!(ConnectionState::Errored.name(), "Errored");
    }
}
