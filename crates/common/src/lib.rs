/// Common types and utilities shared across the herb classification service
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Service-level errors
///
/// Leaf crates define their own error enums and convert into this taxonomy
/// at the API boundary, where each variant maps to an HTTP status.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Inference is unavailable: {0}")]
    InferenceUnavailable(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Deployment configuration fault: {0}")]
    Deployment(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Upload extensions accepted by the service
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Maximum accepted upload size (16 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

/// Prediction produced by the classification pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Resolved class name, or `Unknown (Class N)` for indices beyond the
    /// configured label table
    pub label: String,
    /// Arg-max score expressed as a percentage (0-100)
    pub confidence: f32,
}

/// Extract and validate the extension of an uploaded file name
///
/// Returns the lowercased extension when it is one of
/// [`ALLOWED_IMAGE_EXTENSIONS`].
pub fn allowed_extension(filename: &str) -> Option<String> {
    let ext = filename.rsplit_once('.')?.1.to_lowercase();
    if ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(ext)
    } else {
        None
    }
}

/// Validate an upload's file name and byte size
///
/// Returns the lowercased extension on success.
pub fn validate_upload(filename: &str, size: u64) -> Result<String> {
    if size > MAX_UPLOAD_BYTES {
        return Err(ServiceError::InvalidUpload(format!(
            "file too large: {size} bytes (max: {MAX_UPLOAD_BYTES})"
        )));
    }
    allowed_extension(filename).ok_or_else(|| {
        ServiceError::InvalidUpload(format!(
            "unsupported file type: {filename} (allowed: {})",
            ALLOWED_IMAGE_EXTENSIONS.join(", ")
        ))
    })
}
