use crate::api::{AnalysisResult, PredictionClient, ProgressFn, UploadFile};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::StreamingSession;
use crate::transport::{StreamTransport, WebSocketTransport};
use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::Arc;

/// Everything one user's views share: the selected recording, the last
/// analysis, and the live stream.
///
/// Views receive this by reference instead of reaching for ambient state.
pub struct AppSession {
    client: PredictionClient,
    transport: Arc<dyn StreamTransport>,
    selected_file: Option<UploadFile>,
    last_result: Option<AnalysisResult>,
    last_error: Option<String>,
    stream: Option<StreamingSession>,
}

impl AppSession {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_transport(config, Arc::new(WebSocketTransport::new()))
    }

    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn StreamTransport>,
    ) -> Result<Self> {
        Ok(Self {
            client: PredictionClient::new(config)?,
            transport,
            selected_file: None,
            last_result: None,
            last_error: None,
            stream: None,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.client.config()
    }

    pub fn client(&self) -> &PredictionClient {
        &self.client
    }

    /// Select a recording. An unsupported file is reported and leaves the
    /// previous selection in place.
    pub async fn select_file(&mut self, path: impl AsRef<Path>) -> Result<(), ApiError> {
        match UploadFile::from_path(path).await {
            Ok(file) => {
                self.set_selected_file(file);
                Ok(())
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn set_selected_file(&mut self, file: UploadFile) {
        self.selected_file = Some(file);
        self.last_error = None;
    }

    pub fn clear_selection(&mut self) {
        self.selected_file = None;
        self.last_result = None;
        self.last_error = None;
    }

    pub fn selected_file(&self) -> Option<&UploadFile> {
        self.selected_file.as_ref()
    }

    pub fn last_result(&self) -> Option<&AnalysisResult> {
        self.last_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Upload the selected recording. On failure the error message is kept
    /// for display and the previous result is left untouched.
    pub async fn analyze(
        &mut self,
        progress: Option<ProgressFn>,
    ) -> Result<&AnalysisResult, ApiError> {
        let file = self.selected_file.as_ref().ok_or(ApiError::NoFileSelected)?;
        self.last_error = None;
        match self.client.predict(file, progress).await {
            Ok(result) => Ok(&*self.last_result.insert(result)),
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// The live stream, created on first use.
    pub fn stream(&mut self) -> Result<&StreamingSession> {
        if self.stream.is_none() {
            let session = StreamingSession::spawn(self.client.config(), self.transport.clone())?;
            self.stream = Some(session);
        }
        self.stream
            .as_ref()
            .ok_or_else(|| anyhow!("streaming session unavailable"))
    }

    /// Tear down the live stream, if one was created.
    pub async fn close_stream(&mut self) -> Result<()> {
        if let Some(session) = self.stream.take() {
            session.shutdown().await?;
        }
        Ok(())
    }
}
