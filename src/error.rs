use thiserror::Error;

/// Failures surfaced to the user by the prediction client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no EEG file selected")]
    NoFileSelected,
    #[error("Please upload a valid EEG file (.edf, .csv, .mat, .eea): {file_name}")]
    UnsupportedFile { file_name: String },
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{message}")]
    Backend { status: u16, message: String },
    #[error("Failed to analyze EEG data. Please ensure the backend is running.")]
    Unreachable(#[source] reqwest::Error),
    #[error("invalid analysis response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// HTTP status of a backend rejection, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid service base address {value:?}: {reason}")]
    InvalidBaseUrl { value: String, reason: String },
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}
