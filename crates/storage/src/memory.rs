//! In-memory herb store
//!
//! Backs tests and the API server's fallback when `PostgreSQL` is
//! unreachable: a down database degrades the service, it does not stop it.

use tokio::sync::RwLock;
use tracing::info;

use crate::{
    recommend_from_rules, seed, HerbRecord, HerbStore, RecommendedHerb, SeedReport, StorageResult,
    SymptomRule,
};

/// Herb store held entirely in process memory
#[derive(Default)]
pub struct MemoryHerbStore {
    herbs: RwLock<Vec<HerbRecord>>,
    rules: RwLock<Vec<SymptomRule>>,
}

impl MemoryHerbStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a herb record directly (test fixture path)
    pub async fn insert_herb(&self, herb: HerbRecord) {
        self.herbs.write().await.push(herb);
    }

    /// Insert a symptom rule directly (test fixture path)
    pub async fn insert_rule(&self, rule: SymptomRule) {
        self.rules.write().await.push(rule);
    }
}

#[async_trait::async_trait]
impl HerbStore for MemoryHerbStore {
    async fn find_herb(&self, name: &str) -> StorageResult<Option<HerbRecord>> {
        let herbs = self.herbs.read().await;
        Ok(herbs
            .iter()
            .find(|herb| herb.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn recommend(&self, symptoms: &str) -> StorageResult<Vec<RecommendedHerb>> {
        let rules = self.rules.read().await;
        Ok(recommend_from_rules(&rules, symptoms))
    }

    async fn herb_count(&self) -> StorageResult<u64> {
        Ok(self.herbs.read().await.len() as u64)
    }

    async fn seed(&self) -> StorageResult<SeedReport> {
        let mut herbs = self.herbs.write().await;
        if !herbs.is_empty() {
            info!("Herb store already seeded, skipping");
            return Ok(SeedReport { herbs: 0, rules: 0 });
        }

        let seed_herbs = seed::seed_herbs()?;
        let seed_rules = seed::seed_rules()?;

        let report = SeedReport {
            herbs: seed_herbs.len(),
            rules: seed_rules.len(),
        };

        *herbs = seed_herbs;
        *self.rules.write().await = seed_rules;

        info!("Seeded {} herbs and {} symptom rules", report.herbs, report.rules);
        Ok(report)
    }
}
