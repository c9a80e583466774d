//! Integration tests for the API server
//!
//! Drives the router through its public surface the way a deployed client
//! would, with the in-memory store and no model artifact (the degraded
//! mode every fresh checkout starts in).

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use herb_api_server::{build_router, ApiState};
use herb_storage::{HerbStore, MemoryHerbStore};

async fn degraded_app(upload_dir: &std::path::Path) -> axum::Router {
    let store = MemoryHerbStore::new();
    store.seed().await.unwrap();
    build_router(ApiState::new(None, Arc::new(store), upload_dir.to_path_buf()))
}

async fn body_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint_shape() {
    let dir = tempfile::tempdir().unwrap();
    let app = degraded_app(dir.path()).await;

    let response = app
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["inference"], "unavailable");
}

#[tokio::test]
async fn test_predict_degraded_mode_keeps_other_endpoints_usable() {
    let dir = tempfile::tempdir().unwrap();

    // Predict is unavailable without a model artifact
    let boundary = "herb-test";
    let multipart_body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"image\"; filename=\"leaf.jpg\"\r\n\
         Content-Type: image/jpeg\r\n\r\n\
         bytes\r\n\
         --{boundary}--\r\n"
    );
    let response = degraded_app(dir.path())
        .await
        .oneshot(
            Request::post("/api/predict")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(multipart_body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    // But the store-backed endpoints still work
    let response = degraded_app(dir.path())
        .await
        .oneshot(
            Request::post("/api/recommend")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"symptoms": "migraine and stiff joints"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response.into_body()).await;
    let recommendations = json["recommendations"].as_array().unwrap();
    assert!(!recommendations.is_empty());
    // Every recommendation carries the document fields clients render
    for herb in recommendations {
        assert!(herb["name"].is_string());
        assert!(herb["dosage"].is_string());
        assert!(matches!(herb["type"].as_str(), Some("primary" | "secondary")));
    }
}

#[tokio::test]
async fn test_missing_upload_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = degraded_app(dir.path()).await;

    let response = app
        .oneshot(
            Request::get("/api/uploads/00000000-0000-0000-0000-000000000000.png")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
