//! API Server Binary Entry Point

use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use herb_api_server::{start_server, ApiState};
use herb_classification::{ClassifierConfig, HerbClassifier};
use herb_storage::{HerbStore, MemoryHerbStore, PostgresConfig, PostgresHerbStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "herb_api_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("HERB_API_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let upload_dir: PathBuf = std::env::var("HERB_UPLOAD_DIR")
        .unwrap_or_else(|_| "uploads".to_string())
        .into();
    std::fs::create_dir_all(&upload_dir)?;

    // Load the classifier once; a failed load leaves the service in degraded
    // mode rather than taking the whole process down
    let classifier = match HerbClassifier::new(ClassifierConfig::default()) {
        Ok(classifier) => Some(Arc::new(classifier)),
        Err(e) => {
            tracing::error!("Model artifact failed to load, serving degraded: {}", e);
            None
        }
    };

    let store: Arc<dyn HerbStore> = match PostgresHerbStore::new(PostgresConfig::default()).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!("PostgreSQL unreachable ({}), using in-memory herb store", e);
            let fallback = MemoryHerbStore::new();
            fallback.seed().await?;
            Arc::new(fallback)
        }
    };

    let state = ApiState::new(classifier, store, upload_dir);

    tracing::info!("Starting herb classification API server");
    start_server(&addr, state).await?;

    Ok(())
}
