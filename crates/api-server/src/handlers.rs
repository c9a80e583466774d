//! HTTP request handlers for API endpoints

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    ApiState, ErrorResponse, HealthResponse, PredictResponse, RecommendRequest, RecommendResponse,
};
use herb_classification::ClassificationError;
use herb_common::validate_upload;
use herb_storage::HerbStore;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

/// Health check endpoint
pub async fn health_check(State(state): State<ApiState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        inference: if state.classifier.is_some() {
            "ready".to_string()
        } else {
            "unavailable".to_string()
        },
    })
}

/// Classify an uploaded herb image
///
/// Persists the upload, runs the classification pipeline on a blocking
/// worker, and joins the resolved label against the herb store.
pub async fn predict(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    // Degraded mode: the artifact failed to load at startup
    let Some(classifier) = state.classifier.clone() else {
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Inference is unavailable: model artifact failed to load",
        ));
    };

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("image") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(|e| {
                api_error(StatusCode::BAD_REQUEST, format!("Failed to read upload: {e}"))
            })?;
            upload = Some((filename, bytes.to_vec()));
            break;
        }
    }

    let Some((original_name, bytes)) = upload else {
        return Err(api_error(StatusCode::BAD_REQUEST, "No image provided"));
    };
    if original_name.is_empty() || bytes.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No image selected"));
    }

    let extension = validate_upload(&original_name, bytes.len() as u64)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    // Persist under a fresh name; the file is served back via /api/uploads
    let filename = format!("{}.{}", Uuid::new_v4(), extension);
    let file_path = state.upload_dir.join(&filename);
    tokio::fs::write(&file_path, &bytes).await.map_err(|e| {
        error!("Failed to persist upload {}: {}", file_path.display(), e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store upload")
    })?;

    info!("Running prediction for upload {}", filename);

    // The pipeline is synchronous and CPU-bound; keep it off the reactor
    let predict_path = file_path.clone();
    let prediction = tokio::task::spawn_blocking(move || classifier.predict(&predict_path))
        .await
        .map_err(|e| {
            error!("Prediction task panicked: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Prediction failed")
        })?
        .map_err(|e| match e {
            ClassificationError::Decode(msg) => {
                api_error(StatusCode::BAD_REQUEST, format!("Failed to decode image: {msg}"))
            }
            // Configuration/artifact faults, distinct from bad uploads
            other => {
                error!("Prediction failed: {}", other);
                api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        })?;

    let herb = state.store.find_herb(&prediction.label).await.map_err(|e| {
        error!("Herb lookup failed: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let Some(herb) = herb else {
        warn!("No herb record for predicted label '{}'", prediction.label);
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Herb details not found in database".to_string(),
                prediction: Some(prediction.label),
                confidence: Some(prediction.confidence),
            }),
        ));
    };

    Ok(Json(PredictResponse {
        name: herb.name,
        scientific: herb.scientific_name,
        nature: herb.nature,
        dosha: herb.dosha_compatibility,
        description: herb.description,
        confidence: prediction.confidence,
        image_url: format!("/api/uploads/{filename}"),
    }))
}

/// Symptom-based herb recommendations
pub async fn recommend(
    State(state): State<ApiState>,
    Json(request): Json<RecommendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.symptoms.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No symptoms provided"));
    }

    let recommendations = state.store.recommend(&request.symptoms).await.map_err(|e| {
        error!("Recommendation lookup failed: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(RecommendResponse { recommendations }))
}

/// Serve a previously uploaded image
pub async fn serve_upload(
    State(state): State<ApiState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // Uploads are flat uuid-named files; anything path-like is hostile
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(api_error(StatusCode::BAD_REQUEST, "Invalid file name"));
    }

    let path = state.upload_dir.join(&filename);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| api_error(StatusCode::NOT_FOUND, format!("No such upload: {filename}")))?;

    let content_type = match filename.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}
