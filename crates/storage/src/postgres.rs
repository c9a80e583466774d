//! `PostgreSQL` herb store
//!
//! Herbs and symptom rules are stored as one JSONB document per row,
//! keeping the document shape identical across backends.

use serde::{Deserialize, Serialize};
use tokio_postgres::{Client, NoTls};
use tracing::info;

use crate::{
    recommend_from_rules, seed, HerbRecord, HerbStore, RecommendedHerb, SeedReport, StorageError,
    StorageResult, SymptomRule,
};

/// `PostgreSQL` configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Database host
    pub host: String,

    /// Database port
    pub port: u16,

    /// Database name
    pub database: String,

    /// Database user
    pub user: String,

    /// Database password
    pub password: String,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("HERB_PG_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("HERB_PG_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5432),
            database: std::env::var("HERB_PG_DB").unwrap_or_else(|_| "herbs".to_string()),
            user: std::env::var("HERB_PG_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("HERB_PG_PASSWORD").unwrap_or_default(),
        }
    }
}

impl PostgresConfig {
    /// Build connection string
    #[must_use]
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.database, self.user, self.password
        )
    }
}

/// `PostgreSQL` herb store implementation
pub struct PostgresHerbStore {
    client: Client,
}

impl PostgresHerbStore {
    /// Connect and ensure the schema exists
    pub async fn new(config: PostgresConfig) -> StorageResult<Self> {
        let (client, connection) = tokio_postgres::connect(&config.connection_string(), NoTls)
            .await
            .map_err(|e| StorageError::Postgres(e.to_string()))?;

        // Drive the connection in the background
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        let store = Self { client };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> StorageResult<()> {
        self.client
            .batch_execute(
                r"
                CREATE TABLE IF NOT EXISTS herbs (
                    name TEXT PRIMARY KEY,
                    doc JSONB NOT NULL
                );
                CREATE TABLE IF NOT EXISTS recommendations (
                    symptom TEXT PRIMARY KEY,
                    doc JSONB NOT NULL
                );
                ",
            )
            .await
            .map_err(|e| StorageError::Postgres(e.to_string()))?;
        Ok(())
    }

    async fn load_rules(&self) -> StorageResult<Vec<SymptomRule>> {
        let rows = self
            .client
            .query("SELECT doc FROM recommendations", &[])
            .await
            .map_err(|e| StorageError::Postgres(e.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let doc: serde_json::Value = row.get(0);
                serde_json::from_value(doc)
                    .map_err(|e| StorageError::Serialization(format!("recommendation doc: {e}")))
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl HerbStore for PostgresHerbStore {
    async fn find_herb(&self, name: &str) -> StorageResult<Option<HerbRecord>> {
        let row = self
            .client
            .query_opt("SELECT doc FROM herbs WHERE lower(name) = lower($1)", &[&name])
            .await
            .map_err(|e| StorageError::Postgres(e.to_string()))?;

        match row {
            Some(row) => {
                let doc: serde_json::Value = row.get(0);
                let herb = serde_json::from_value(doc)
                    .map_err(|e| StorageError::Serialization(format!("herb doc: {e}")))?;
                Ok(Some(herb))
            }
            None => Ok(None),
        }
    }

    async fn recommend(&self, symptoms: &str) -> StorageResult<Vec<RecommendedHerb>> {
        let rules = self.load_rules().await?;
        Ok(recommend_from_rules(&rules, symptoms))
    }

    async fn herb_count(&self) -> StorageResult<u64> {
        let row = self
            .client
            .query_one("SELECT COUNT(*) FROM herbs", &[])
            .await
            .map_err(|e| StorageError::Postgres(e.to_string()))?;
        let count: i64 = row.get(0);
        Ok(count as u64)
    }

    async fn seed(&self) -> StorageResult<SeedReport> {
        if self.herb_count().await? > 0 {
            info!("Herb store already seeded, skipping");
            return Ok(SeedReport { herbs: 0, rules: 0 });
        }

        let herbs = seed::seed_herbs()?;
        let rules = seed::seed_rules()?;

        for herb in &herbs {
            let doc = serde_json::to_value(herb)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            self.client
                .execute(
                    "INSERT INTO herbs (name, doc) VALUES ($1, $2)",
                    &[&herb.name, &doc],
                )
                .await
                .map_err(|e| StorageError::Postgres(e.to_string()))?;
        }

        for rule in &rules {
            let doc = serde_json::to_value(rule)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            self.client
                .execute(
                    "INSERT INTO recommendations (symptom, doc) VALUES ($1, $2)",
                    &[&rule.symptom, &doc],
                )
                .await
                .map_err(|e| StorageError::Postgres(e.to_string()))?;
        }

        let report = SeedReport {
            herbs: herbs.len(),
            rules: rules.len(),
        };
        info!("Seeded {} herbs and {} symptom rules", report.herbs, report.rules);
        Ok(report)
    }
}
