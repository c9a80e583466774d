//! REST API server for the herb classification service
//!
//! Exposes the inference pipeline and the herb knowledge base:
//! - `POST /api/predict`: classify an uploaded herb image
//! - `POST /api/recommend`: symptom-based herb recommendations
//! - `GET /api/health`: liveness plus inference availability
//! - `GET /api/uploads/{filename}`: serve previously uploaded images
//!
//! If the model artifact fails to load at startup, the process stays up in
//! degraded mode: predict returns 503 while the store-backed endpoints keep
//! working.

mod handlers;
mod types;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use herb_classification::HerbClassifier;
use herb_common::MAX_UPLOAD_BYTES;
use herb_storage::HerbStore;

pub use handlers::*;
pub use types::*;

/// API server state shared across handlers
#[derive(Clone)]
pub struct ApiState {
    /// Loaded classifier, or `None` when the artifact failed to load
    pub classifier: Option<Arc<HerbClassifier>>,
    /// Herb knowledge base
    pub store: Arc<dyn HerbStore>,
    /// Directory uploaded images are persisted into
    pub upload_dir: PathBuf,
}

impl ApiState {
    /// Create new API state
    #[must_use]
    pub fn new(
        classifier: Option<Arc<HerbClassifier>>,
        store: Arc<dyn HerbStore>,
        upload_dir: PathBuf,
    ) -> Self {
        Self {
            classifier,
            store,
            upload_dir,
        }
    }
}

/// Build the API router with all endpoints
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        // Health check
        .route("/api/health", get(health_check))
        // Classification
        .route("/api/predict", post(predict))
        // Recommendations
        .route("/api/recommend", post(recommend))
        // Uploaded image serving
        .route("/api/uploads/{filename}", get(serve_upload))
        // Middleware
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES as usize))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server
pub async fn start_server(addr: &str, state: ApiState) -> Result<(), std::io::Error> {
    tracing::info!("Starting API server on {}", addr);

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await
}
