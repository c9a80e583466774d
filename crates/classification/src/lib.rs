//! Herb image classification using a pre-trained CNN via ONNX Runtime
//!
//! This crate implements the inference pipeline of the herb identification
//! service: image preprocessing, model inference, and label resolution with
//! confidence scoring.
//!
//! # Pipeline
//! Data flows one way through three stages:
//! 1. **Normalizer**: decode an image file, resize it to the model's fixed
//!    input size, and scale it into a `[1, H, W, 3]` float tensor
//! 2. **Classifier**: run the tensor through the loaded ONNX session and
//!    collect the raw score vector
//! 3. **Resolver**: arg-max the scores and map the winning index to a herb
//!    name with a percentage confidence
//!
//! The loaded session and label table are read-only for the process
//! lifetime; every request gets a fresh tensor and a fresh result.
//!
//! # Example
//! ```no_run
//! use herb_classification::{ClassifierConfig, HerbClassifier};
//!
//! # fn main() -> Result<(), herb_classification::ClassificationError> {
//! let classifier = HerbClassifier::new(ClassifierConfig::default())?;
//!
//! let prediction = classifier.predict("leaf.jpg")?;
//! println!("{}: {:.1}%", prediction.label, prediction.confidence);
//! # Ok(())
//! # }
//! ```

mod classifier;
mod labels;
mod preprocess;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub use classifier::HerbClassifier;
pub use herb_common::PredictionResult;
pub use labels::{argmax, resolve_prediction, LabelTable, DEFAULT_HERB_CLASSES};
pub use preprocess::{normalize_file, normalize_image};

use herb_common::ServiceError;

/// Errors that can occur in the classification pipeline
#[derive(Debug, Error)]
pub enum ClassificationError {
    /// Input file is missing or its bytes are not a decodable image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Presented tensor disagrees with the configured input contract.
    /// A deployment fault, surfaced distinctly from bad uploads.
    #[error("Input shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Inference error: {0}")]
    Inference(String),

    /// Score tensor with unexpected rank/width, or an empty score vector
    #[error("Invalid model output: {0}")]
    InvalidOutput(String),
}

impl From<image::ImageError> for ClassificationError {
    fn from(err: image::ImageError) -> Self {
        ClassificationError::Decode(err.to_string())
    }
}

impl From<ClassificationError> for ServiceError {
    fn from(err: ClassificationError) -> Self {
        match err {
            ClassificationError::Decode(msg) => ServiceError::Decode(msg),
            ClassificationError::ShapeMismatch { .. } => ServiceError::Deployment(err.to_string()),
            ClassificationError::ModelLoad(msg) => ServiceError::InferenceUnavailable(msg),
            ClassificationError::Inference(msg) | ClassificationError::InvalidOutput(msg) => {
                ServiceError::Inference(msg)
            }
        }
    }
}

/// Per-channel standardization applied after rescaling
///
/// Only artifacts trained with ImageNet-style preprocessing use this; the
/// canonical herb model was trained on plain `[0, 1]` inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Standardization {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Standardization {
    /// ImageNet statistics, the common choice for transfer-learned backbones
    #[must_use]
    pub fn imagenet() -> Self {
        Self {
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        }
    }
}

/// Channel order expected by the model input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

/// Preprocessing contract of a deployed model artifact
///
/// Different trained artifacts in this family expect different input sizes
/// and normalization, so the whole contract is data, not code: one
/// normalizer parameterized by a profile, never parallel code paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingProfile {
    /// Fixed input height the model was trained with
    pub input_height: u32,
    /// Fixed input width the model was trained with
    pub input_width: u32,
    /// Linear scale applied to `[0, 255]` channel values
    pub rescale: f32,
    /// Channel order of the model input
    pub channel_order: ChannelOrder,
    /// Optional per-channel standardization after rescaling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standardize: Option<Standardization>,
}

impl Default for PreprocessingProfile {
    fn default() -> Self {
        Self {
            input_height: 224,
            input_width: 224,
            rescale: 1.0 / 255.0,
            channel_order: ChannelOrder::Rgb,
            standardize: None,
        }
    }
}

impl PreprocessingProfile {
    /// Tensor shape this profile produces: `[1, H, W, 3]`
    #[must_use]
    pub fn input_shape(&self) -> [usize; 4] {
        [1, self.input_height as usize, self.input_width as usize, 3]
    }
}

/// Configuration for the herb classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Path to the ONNX model artifact
    pub model_path: PathBuf,
    /// Preprocessing contract of the artifact
    #[serde(default)]
    pub profile: PreprocessingProfile,
    /// Ordered class names the artifact was trained on
    #[serde(default)]
    pub labels: LabelTable,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: std::env::var("HERB_MODEL_PATH")
                .unwrap_or_else(|_| "models/herb_classifier.onnx".to_string())
                .into(),
            profile: PreprocessingProfile::default(),
            labels: LabelTable::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_default() {
        let profile = PreprocessingProfile::default();
        assert_eq!(profile.input_height, 224);
        assert_eq!(profile.input_width, 224);
        assert_eq!(profile.channel_order, ChannelOrder::Rgb);
        assert!(profile.standardize.is_none());
        assert!((profile.rescale - 1.0 / 255.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_profile_input_shape() {
        let profile = PreprocessingProfile {
            input_height: 150,
            input_width: 128,
            ..PreprocessingProfile::default()
        };
        assert_eq!(profile.input_shape(), [1, 150, 128, 3]);
    }

    #[test]
    fn test_profile_serialization_roundtrip() {
        let profile = PreprocessingProfile {
            standardize: Some(Standardization::imagenet()),
            channel_order: ChannelOrder::Bgr,
            ..PreprocessingProfile::default()
        };

        let json = serde_json::to_string(&profile).unwrap();
        let deserialized: PreprocessingProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.channel_order, ChannelOrder::Bgr);
        assert_eq!(deserialized.standardize, Some(Standardization::imagenet()));
    }

    #[test]
    fn test_shape_mismatch_display() {
        let err = ClassificationError::ShapeMismatch {
            expected: vec![1, 224, 224, 3],
            actual: vec![1, 100, 100, 3],
        };
        assert_eq!(
            err.to_string(),
            "Input shape mismatch: expected [1, 224, 224, 3], got [1, 100, 100, 3]"
        );
    }

    #[test]
    fn test_error_maps_to_service_error() {
        let err: ServiceError = ClassificationError::Decode("bad bytes".to_string()).into();
        assert!(matches!(err, ServiceError::Decode(_)));

        let err: ServiceError = ClassificationError::ShapeMismatch {
            expected: vec![1, 224, 224, 3],
            actual: vec![1, 100, 100, 3],
        }
        .into();
        assert!(matches!(err, ServiceError::Deployment(_)));

        let err: ServiceError = ClassificationError::ModelLoad("missing".to_string()).into();
        assert!(matches!(err, ServiceError::InferenceUnavailable(_)));
    }
}
