use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Environment variable overriding the service base address
pub const BASE_URL_ENV: &str = "EEGSCOPE_API_BASE";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Client-side settings for talking to the analysis service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// HTTP base address of the analysis service
    pub base_url: String,

    /// Path of the live stream, appended to the base address
    pub stream_path: String,

    /// Rolling buffer capacity in samples
    pub max_data_points: usize,

    /// Channel count for synthesized samples
    pub channel_count: usize,

    /// Period of the demo-mode generator
    pub fallback_interval_ms: u64,

    /// Upper bound on a single prediction request
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            stream_path: "/ws/stream".to_string(),
            max_data_points: 100,
            channel_count: 8,
            fallback_interval_ms: 100,
            request_timeout_secs: 120,
        }
    }
}

impl ClientConfig {
    /// Load from a JSON file; missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .context(format!("Failed to read config from {:?}", path))?;
        let config: ClientConfig =
            serde_json::from_str(&json).context("Failed to parse client config")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `EEGSCOPE_API_BASE` if it is set and non-empty.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base) = std::env::var(BASE_URL_ENV) {
            if !base.trim().is_empty() {
                self.base_url = base.trim().to_string();
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base()?;
        if self.max_data_points == 0 {
            return Err(ConfigError::Zero { field: "max_data_points" });
        }
        if self.channel_count == 0 {
            return Err(ConfigError::Zero { field: "channel_count" });
        }
        if self.fallback_interval_ms == 0 {
            return Err(ConfigError::Zero { field: "fallback_interval_ms" });
        }
        Ok(())
    }

    /// Parsed base address; only http and https are accepted.
    pub fn base(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            value: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::InvalidBaseUrl {
                value: self.base_url.clone(),
                reason: format!("unsupported scheme {}", other),
            }),
        }
    }

    /// Absolute URL for a service path such as `/predict`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        Ok(join_path(&self.base()?, path))
    }

    /// Streaming URL: the base address with `http` swapped for `ws`
    /// (`https` becomes `wss`) plus the stream path.
    pub fn stream_url(&self) -> Result<Url, ConfigError> {
        let mut url = self.endpoint(&self.stream_path)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| ConfigError::InvalidBaseUrl {
                value: self.base_url.clone(),
                reason: "cannot derive stream scheme".to_string(),
            })?;
        Ok(url)
    }

    pub fn fallback_interval(&self) -> Duration {
        Duration::from_millis(self.fallback_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Append `path` to whatever path the base already carries, so a base of
/// `http://host/api` yields `http://host/api/predict`.
fn join_path(base: &Url, path: &str) -> Url {
    let prefix = base.path().trim_end_matches('/');
    let suffix = path.trim_start_matches('/');
    let mut url = base.clone();
    url.set_path(&format!("{}/{}", prefix, suffix));
    url.set_query(None);
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_dashboard() {
        let config = ClientConfig::default();
        assert_eq!(config.max_data_points, 100);
        assert_eq!(config.channel_count, 8);
        assert_eq!(config.fallback_interval(), Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_stream_url_swaps_scheme() {
        let config = ClientConfig::default();
        assert_eq!(
            config.stream_url().unwrap().as_str(),
            "ws://127.0.0.1:8000/ws/stream"
        );

        let secure = ClientConfig {
            base_url: "https://eeg.example.org/api/".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(
            secure.stream_url().unwrap().as_str(),
            "wss://eeg.example.org/api/ws/stream"
        );
        assert_eq!(
            secure.endpoint("/predict").unwrap().as_str(),
            "https://eeg.example.org/api/predict"
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        let ws_base = ClientConfig {
            base_url: "ws://127.0.0.1:8000".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(ws_base.validate(), Err(ConfigError::InvalidBaseUrl { .. })));

        let empty = ClientConfig {
            max_data_points: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(
            empty.validate(),
            Err(ConfigError::Zero { field: "max_data_points" })
        ));
    }

    #[test]
    fn test_from_file_keeps_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"base_url": "http://10.0.0.5:9000", "max_data_points": 250}}"#).unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.max_data_points, 250);
        assert_eq!(config.channel_count, 8);
    }
}
