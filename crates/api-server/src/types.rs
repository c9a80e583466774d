//! API request and response types

use serde::{Deserialize, Serialize};

use herb_storage::RecommendedHerb;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// `"ready"` when the model artifact loaded, `"unavailable"` otherwise
    pub inference: String,
}

/// Successful prediction response: the classification joined with herb
/// metadata from the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub name: String,
    pub scientific: String,
    pub nature: String,
    pub dosha: String,
    pub description: String,
    pub confidence: f32,
    pub image_url: String,
}

/// Symptom recommendation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub symptoms: String,
}

/// Symptom recommendation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<RecommendedHerb>,
}

/// Error body returned by every failing endpoint
///
/// A prediction whose label has no herb record still carries the label and
/// confidence, so a stale knowledge base degrades the response instead of
/// discarding the classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            prediction: None,
            confidence: None,
        }
    }
}
