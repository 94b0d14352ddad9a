use super::types::{AnalysisResult, ServiceInfo};
use super::upload::UploadFile;
use crate::config::ClientConfig;
use crate::error::ApiError;
use anyhow::{Context, Result};
use futures::stream;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use std::sync::Arc;
use url::Url;

/// Upload progress callback, called with a whole percentage
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Bytes handed to the HTTP body per progress step
const UPLOAD_CHUNK: usize = 64 * 1024;

/// Client for the analysis service's HTTP endpoints
#[derive(Clone)]
pub struct PredictionClient {
    http: Client,
    config: ClientConfig,
}

impl PredictionClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Upload a recording to `POST /predict` and return the validated result.
    pub async fn predict(
        &self,
        file: &UploadFile,
        progress: Option<ProgressFn>,
    ) -> Result<AnalysisResult, ApiError> {
        let url = self.url("/predict")?;
        let total = file.len();
        let body = progress_body(file.bytes().to_vec(), progress);
        let part = Part::stream_with_length(body, total as u64)
            .file_name(file.file_name().to_string());
        let form = Form::new().part("file", part);

        log::info!("uploading {} ({} bytes) to {}", file.file_name(), total, url);
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::Unreachable)?;

        let result: AnalysisResult = read_json(response).await?;
        result.validate()?;
        log::info!(
            "{}: {} ({:.1}% confidence)",
            file.file_name(),
            result.prediction,
            result.confidence
        );
        Ok(result)
    }

    /// `GET /`: the service's liveness message.
    pub async fn health(&self) -> Result<ServiceInfo, ApiError> {
        let url = self.url("/")?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ApiError::Unreachable)?;
        read_json(response).await
    }

    /// Absolute address of a heatmap, which the service reports as a path.
    pub fn heatmap_url(&self, result: &AnalysisResult) -> Option<Url> {
        let heatmap = result.heatmap.as_deref()?;
        if let Ok(url) = Url::parse(heatmap) {
            return Some(url);
        }
        self.config.endpoint(heatmap).ok()
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.config.endpoint(path)?)
    }
}

/// Split the payload into chunks, reporting progress as each is consumed.
fn progress_body(bytes: Vec<u8>, progress: Option<ProgressFn>) -> Body {
    let total = bytes.len();
    if total == 0 {
        if let Some(report) = &progress {
            report(100);
        }
        return Body::from(bytes);
    }

    let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK).map(<[u8]>::to_vec).collect();
    let mut sent = 0usize;
    let stream = stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len();
        if let Some(report) = &progress {
            report(upload_percent(sent, total));
        }
        Ok::<_, std::io::Error>(chunk)
    }));
    Body::wrap_stream(stream)
}

/// `round(sent * 100 / total)`, treating an unknown total as 1.
pub fn upload_percent(sent: usize, total: usize) -> u8 {
    let pct = (sent as f64 * 100.0 / total.max(1) as f64).round();
    pct.clamp(0.0, 100.0) as u8
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await.map_err(ApiError::Unreachable)?;
    if !status.is_success() {
        return Err(backend_error(status.as_u16(), &body));
    }
    serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

/// Error payloads carry a `detail` field; anything else gets the generic
/// message.
fn backend_error(status: u16, body: &str) -> ApiError {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("detail") {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        });
    let message = detail.unwrap_or_else(|| {
        "Failed to analyze EEG data. Please ensure the backend is running.".to_string()
    });
    log::warn!("analysis service returned {}: {}", status, message);
    ApiError::Backend { status, message }
}
