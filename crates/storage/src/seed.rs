//! Embedded seed data for the herb knowledge base
//!
//! Carries the initial herb and recommendation documents compiled into the
//! binary, so a fresh deployment can seed itself without external fixtures.

use crate::{HerbRecord, StorageError, StorageResult, SymptomRule};

const HERBS_JSON: &str = include_str!("../data/herbs.json");
const RECOMMENDATIONS_JSON: &str = include_str!("../data/recommendations.json");

/// Herb records shipped with the service
pub fn seed_herbs() -> StorageResult<Vec<HerbRecord>> {
    serde_json::from_str(HERBS_JSON)
        .map_err(|e| StorageError::Serialization(format!("embedded herb seed data: {e}")))
}

/// Symptom rules shipped with the service
pub fn seed_rules() -> StorageResult<Vec<SymptomRule>> {
    serde_json::from_str(RECOMMENDATIONS_JSON)
        .map_err(|e| StorageError::Serialization(format!("embedded recommendation seed data: {e}")))
}
