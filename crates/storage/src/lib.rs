//! Document store for herb metadata and symptom recommendations
//!
//! This crate provides the herb knowledge base the API joins predictions
//! against:
//! - **Herb records**: per-herb metadata (scientific name, nature, dosha
//!   compatibility, description, usage, contraindications)
//! - **Symptom rules**: free-text symptom matching rules mapping to
//!   recommended herbs
//!
//! Two backends implement the [`HerbStore`] trait: `PostgreSQL` (one JSONB
//! document column per table) for deployments, and an in-memory store for
//! tests and for serving with the database unreachable.
//!
//! # Example
//!
//! ```rust,no_run
//! use herb_storage::{HerbStore, MemoryHerbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), herb_storage::StorageError> {
//!     let store = MemoryHerbStore::new();
//!     store.seed().await?;
//!
//!     if let Some(herb) = store.find_herb("tulsi").await? {
//!         println!("{}: {}", herb.name, herb.scientific_name);
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;
pub mod postgres;
pub mod seed;

pub use memory::MemoryHerbStore;
pub use postgres::{PostgresConfig, PostgresHerbStore};

use herb_common::ServiceError;

/// Storage layer errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("PostgreSQL error: {0}")]
    Postgres(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => ServiceError::NotFound(msg),
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Ayurvedic taste/potency properties of a herb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HerbProperties {
    pub taste: Vec<String>,
    pub potency: String,
    pub post_digestive: String,
}

/// How a herb is taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HerbUsage {
    pub dosage: String,
    pub method: String,
    pub timing: String,
}

/// Herb metadata document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HerbRecord {
    pub name: String,
    pub scientific_name: String,
    pub nature: String,
    pub dosha_compatibility: String,
    pub description: String,
    pub properties: HerbProperties,
    pub benefits: Vec<String>,
    pub usage: HerbUsage,
    pub contraindications: Vec<String>,
}

/// Whether a herb is a first-line or supporting recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HerbRole {
    Primary,
    Secondary,
}

/// A herb recommended for a matched symptom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedHerb {
    pub name: String,
    pub dosage: String,
    pub description: String,
    #[serde(rename = "type")]
    pub role: HerbRole,
}

/// Symptom matching rule mapping free-text complaints to herbs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomRule {
    pub symptom: String,
    #[serde(default)]
    pub related_terms: Vec<String>,
    pub herbs: Vec<RecommendedHerb>,
}

impl SymptomRule {
    /// Whether this rule applies to the (lowercased) symptoms text
    #[must_use]
    pub fn matches(&self, symptoms_text: &str) -> bool {
        symptoms_text.contains(&self.symptom)
            || self.related_terms.iter().any(|term| symptoms_text.contains(term))
    }
}

/// Counts of documents inserted by a seeding run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub herbs: usize,
    pub rules: usize,
}

/// Herb knowledge base operations
#[async_trait::async_trait]
pub trait HerbStore: Send + Sync {
    /// Case-insensitive exact-name herb lookup
    async fn find_herb(&self, name: &str) -> StorageResult<Option<HerbRecord>>;

    /// Herbs recommended for a free-text symptoms description
    async fn recommend(&self, symptoms: &str) -> StorageResult<Vec<RecommendedHerb>>;

    /// Number of herb records present
    async fn herb_count(&self) -> StorageResult<u64>;

    /// Insert the embedded seed set; a no-op when herbs already exist
    async fn seed(&self) -> StorageResult<SeedReport>;
}

/// Apply symptom rules to a free-text complaint
///
/// Matching is substring-based on the lowercased input; herbs from all
/// matched rules are unioned, deduplicated by name, first occurrence wins.
#[must_use]
pub fn recommend_from_rules(rules: &[SymptomRule], symptoms: &str) -> Vec<RecommendedHerb> {
    let symptoms_text = symptoms.to_lowercase();
    let mut recommendations: Vec<RecommendedHerb> = Vec::new();

    for rule in rules.iter().filter(|rule| rule.matches(&symptoms_text)) {
        for herb in &rule.herbs {
            if !recommendations.iter().any(|existing| existing.name == herb.name) {
                recommendations.push(herb.clone());
            }
        }
    }

    recommendations
}
