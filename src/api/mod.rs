pub mod client;
pub mod report;
pub mod types;
pub mod upload;

pub use client::{PredictionClient, ProgressFn};
pub use types::{AiReport, AnalysisResult, ServiceInfo};
pub use upload::{is_supported_file, UploadFile, ACCEPTED_EXTENSIONS};
