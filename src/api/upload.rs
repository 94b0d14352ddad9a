use crate::error::ApiError;
use std::path::Path;

/// Recording formats the analysis service understands
pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["edf", "csv", "mat", "eea"];

/// Checks the text after the last `.` (the whole name when there is none);
/// the file content is not inspected.
pub fn is_supported_file(file_name: &str) -> bool {
    let ext = file_name.rsplit('.').next().unwrap_or_default();
    ACCEPTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

/// A recording selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    file_name: String,
    bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ApiError> {
        let file_name = file_name.into();
        if !is_supported_file(&file_name) {
            return Err(ApiError::UnsupportedFile { file_name });
        }
        Ok(Self { file_name, bytes })
    }

    /// Validate the name, then read the file.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !is_supported_file(&file_name) {
            return Err(ApiError::UnsupportedFile { file_name });
        }
        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { file_name, bytes })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
