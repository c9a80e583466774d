//! Label resolution: raw score vector → named prediction
//!
//! The label table is configured per deployment and can legitimately be
//! shorter than the model's output width; label tables drift out of sync
//! with retrained artifacts. An arg-max index beyond the table resolves to
//! a synthetic `Unknown (Class N)` label instead of failing the request.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ClassificationError;
use herb_common::PredictionResult;

/// Herb classes the canonical model artifact was trained on (in order)
pub const DEFAULT_HERB_CLASSES: &[&str] = &[
    "Ashwagandha",
    "Tulsi",
    "Turmeric",
    "Brahmi",
    "Neem",
    "Shatavari",
];

/// Ordered mapping from class index to herb name
///
/// Immutable for the process lifetime once configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelTable {
    names: Vec<String>,
}

impl LabelTable {
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve a class index to its configured name
    ///
    /// Indices beyond the table get the synthetic `Unknown (Class N)` name;
    /// a result with an unresolvable name is still useful to the caller.
    #[must_use]
    pub fn resolve(&self, index: usize) -> String {
        match self.names.get(index) {
            Some(name) => name.clone(),
            None => {
                warn!(
                    "Class index {} is outside the configured label table (len {})",
                    index,
                    self.names.len()
                );
                format!("Unknown (Class {index})")
            }
        }
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new(DEFAULT_HERB_CLASSES.iter().map(ToString::to_string).collect())
    }
}

/// Index of the largest score, first occurrence on ties
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best_index = None;
    let mut best_score = f32::NEG_INFINITY;
    for (index, &score) in scores.iter().enumerate() {
        // Strictly greater keeps the first index on ties
        if score > best_score {
            best_score = score;
            best_index = Some(index);
        }
    }
    best_index
}

/// Turn a raw score vector into a named prediction
///
/// Confidence is the winning score as a percentage; the vector is taken at
/// face value, with no re-normalization, whatever the artifact's final
/// activation produced.
pub fn resolve_prediction(
    scores: &[f32],
    labels: &LabelTable,
) -> Result<PredictionResult, ClassificationError> {
    let index = argmax(scores).ok_or_else(|| {
        ClassificationError::InvalidOutput("empty score vector".to_string())
    })?;

    Ok(PredictionResult {
        label: labels.resolve(index),
        confidence: scores[index] * 100.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(names: &[&str]) -> LabelTable {
        LabelTable::new(names.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn test_default_table_matches_trained_classes() {
        let labels = LabelTable::default();
        assert_eq!(labels.len(), 6);
        assert_eq!(labels.resolve(0), "Ashwagandha");
        assert_eq!(labels.resolve(5), "Shatavari");
    }

    #[test]
    fn test_resolve_known_index() {
        let labels = table(&["Ashwagandha", "Tulsi", "Turmeric"]);
        let prediction = resolve_prediction(&[0.1, 0.7, 0.2], &labels).unwrap();

        assert_eq!(prediction.label, "Tulsi");
        assert!((prediction.confidence - 70.0).abs() < 1e-4);
    }

    #[test]
    fn test_index_beyond_table_resolves_to_synthetic_label() {
        let labels = table(&["Ashwagandha", "Tulsi"]);
        let prediction = resolve_prediction(&[0.1, 0.2, 0.7], &labels).unwrap();

        assert_eq!(prediction.label, "Unknown (Class 2)");
        assert!((prediction.confidence - 70.0).abs() < 1e-4);
    }

    #[test]
    fn test_tie_breaks_to_first_index() {
        let labels = table(&["Ashwagandha", "Tulsi", "Turmeric"]);
        let prediction = resolve_prediction(&[0.4, 0.2, 0.4], &labels).unwrap();

        assert_eq!(prediction.label, "Ashwagandha");
    }

    #[test]
    fn test_argmax_first_occurrence() {
        assert_eq!(argmax(&[0.5, 0.5, 0.5]), Some(0));
        assert_eq!(argmax(&[0.1, 0.9, 0.9]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_empty_scores_are_invalid_output() {
        let result = resolve_prediction(&[], &LabelTable::default());
        assert!(matches!(result, Err(ClassificationError::InvalidOutput(_))));
    }

    #[test]
    fn test_confidence_within_percentage_bounds() {
        let labels = LabelTable::default();
        let prediction = resolve_prediction(&[0.0, 1.0, 0.0], &labels).unwrap();
        assert!(prediction.confidence >= 0.0 && prediction.confidence <= 100.0);

        let prediction = resolve_prediction(&[0.0, 0.0, 0.0], &labels).unwrap();
        assert!((prediction.confidence - 0.0).abs() < 1e-6);
    }
}
