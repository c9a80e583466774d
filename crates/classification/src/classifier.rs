//! Classifier adapter wrapping one loaded ONNX session
//!
//! The session is loaded once at construction and shared read-only for the
//! process lifetime. `ort` sessions need `&mut self` to run, so inference
//! calls serialize through an internal lock; the pipeline favors
//! correctness over request latency.

use ndarray::Array4;
use ort::{session::Session, value::TensorRef};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::labels::resolve_prediction;
use crate::preprocess::normalize_file;
use crate::{ClassificationError, ClassifierConfig, LabelTable, PredictionResult, PreprocessingProfile};

/// Herb classifier backed by a pre-trained ONNX model
pub struct HerbClassifier {
    session: Mutex<Session>,
    profile: PreprocessingProfile,
    labels: LabelTable,
}

impl HerbClassifier {
    /// Load the model artifact and build the classifier
    ///
    /// Loading happens once per process; the artifact is immutable for the
    /// process's lifetime. A load failure leaves inference unavailable but
    /// must not take down endpoints that do not need the model.
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassificationError> {
        let model_path = &config.model_path;
        if !model_path.exists() {
            return Err(ClassificationError::ModelLoad(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }

        info!("Loading herb classifier from {}", model_path.display());

        let session = Session::builder()
            .map_err(|e| ClassificationError::ModelLoad(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| ClassificationError::ModelLoad(e.to_string()))?;

        info!(
            "Herb classifier loaded ({}x{} input, {} labels)",
            config.profile.input_width,
            config.profile.input_height,
            config.labels.len()
        );

        Ok(Self {
            session: Mutex::new(session),
            profile: config.profile,
            labels: config.labels,
        })
    }

    /// Preprocessing contract of the loaded artifact
    #[must_use]
    pub fn profile(&self) -> &PreprocessingProfile {
        &self.profile
    }

    /// Configured label table
    #[must_use]
    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Run inference on a normalized tensor and return the raw score vector
    ///
    /// The tensor shape is validated against the configured input contract
    /// before the engine is touched; a mismatch is never silently reshaped.
    pub fn infer(&self, tensor: &Array4<f32>) -> Result<Vec<f32>, ClassificationError> {
        check_input_shape(&self.profile.input_shape(), tensor.shape())?;

        let input_tensor = TensorRef::from_array_view(tensor.view())
            .map_err(|e| ClassificationError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ClassificationError::Inference("session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ClassificationError::Inference(e.to_string()))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassificationError::Inference(e.to_string()))?;

        // Accept [C] or batched [1, C]; anything else is a broken artifact
        let dims = shape.as_ref();
        let is_score_vector = match dims.len() {
            1 => true,
            2 => dims[0] == 1,
            _ => false,
        };
        if !is_score_vector {
            return Err(ClassificationError::InvalidOutput(format!(
                "expected a single score vector, got output shape {dims:?}"
            )));
        }

        debug!("Inference produced {} class scores", data.len());
        Ok(data.to_vec())
    }

    /// Run the full pipeline: image file → named prediction
    pub fn predict<P: AsRef<Path>>(&self, path: P) -> Result<PredictionResult, ClassificationError> {
        let tensor = normalize_file(path, &self.profile)?;
        let scores = self.infer(&tensor)?;
        resolve_prediction(&scores, &self.labels)
    }
}

/// Validate a tensor shape against the configured input contract
fn check_input_shape(expected: &[usize], actual: &[usize]) -> Result<(), ClassificationError> {
    if expected != actual {
        return Err(ClassificationError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_not_found() {
        let config = ClassifierConfig {
            model_path: "nonexistent_model.onnx".into(),
            ..ClassifierConfig::default()
        };
        let result = HerbClassifier::new(config);
        assert!(matches!(result, Err(ClassificationError::ModelLoad(_))));
    }

    #[test]
    fn test_undersized_tensor_is_shape_mismatch() {
        let result = check_input_shape(&[1, 224, 224, 3], &[1, 100, 100, 3]);
        match result {
            Err(ClassificationError::ShapeMismatch { expected, actual }) => {
                assert_eq!(expected, vec![1, 224, 224, 3]);
                assert_eq!(actual, vec![1, 100, 100, 3]);
            }
            other => panic!("expected shape mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_matching_shape_passes() {
        assert!(check_input_shape(&[1, 224, 224, 3], &[1, 224, 224, 3]).is_ok());
    }
}
