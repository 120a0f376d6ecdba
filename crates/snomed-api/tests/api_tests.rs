//! API Integration Tests
//!
//! The extractor is replaced by an in-process fake, so no network access
//! or credential is needed.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use snomed_api::{create_router, state::AppState};
use snomed_core::{
    AppConfig, ConfidenceScore, EntityContext, EntityExtractor, ExtractedEntity,
    ExtractionError, Locale, Result, SemanticCategory,
};
use std::sync::Arc;
use tower::ServiceExt;

/// Extractor returning a fixed outcome
enum FakeExtractor {
    Entities(Vec<ExtractedEntity>),
    Fails(fn() -> ExtractionError),
}

#[async_trait]
impl EntityExtractor for FakeExtractor {
    async fn extract(&self, _clinical_text: &str) -> Result<Vec<ExtractedEntity>> {
        match self {
            FakeExtractor::Entities(entities) => Ok(entities.clone()),
            FakeExtractor::Fails(make) => Err(make()),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

fn sample_entities() -> Vec<ExtractedEntity> {
    vec![
        ExtractedEntity::new(
            "hemiparesis",
            SemanticCategory::Disorder,
            ConfidenceScore::High,
            EntityContext::Present,
        )
        .with_code("50582007", "Hemiparesis"),
        ExtractedEntity::new(
            "lemah",
            SemanticCategory::Finding,
            ConfidenceScore::Low,
            EntityContext::Present,
        ),
        ExtractedEntity::new(
            "hemiparesis",
            SemanticCategory::Disorder,
            ConfidenceScore::Medium,
            EntityContext::Present,
        )
        .with_code("50582007", "Hemiparesis"),
    ]
}

fn app_with(extractor: FakeExtractor) -> Router {
    app_with_config(AppConfig::default(), extractor)
}

fn app_with_config(config: AppConfig, extractor: FakeExtractor) -> Router {
    let state = AppState::with_extractor(config, Arc::new(extractor));
    create_router(Arc::new(state))
}

/// Helper to create a test request
fn create_json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = app_with(FakeExtractor::Entities(vec![]));

    let response = app
        .oneshot(create_json_request("GET", "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["name"], "snomed-api");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_ready_with_extractor() {
    let app = app_with(FakeExtractor::Entities(vec![]));

    let response = app
        .oneshot(create_json_request("GET", "/ready", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["ready"], true);
    assert_eq!(json["checks"]["credential_configured"], true);
}

#[tokio::test]
async fn test_ready_without_credential() {
    let app = create_router(Arc::new(AppState::new(AppConfig::default())));

    let response = app
        .oneshot(create_json_request("GET", "/ready", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["ready"], false);
}

#[tokio::test]
async fn test_metrics_counts_requests() {
    let state = Arc::new(AppState::with_extractor(
        AppConfig::default(),
        Arc::new(FakeExtractor::Fails(|| {
            ExtractionError::Transport("connection refused".to_string())
        })),
    ));

    let response = create_router(state.clone())
        .oneshot(create_json_request(
            "POST",
            "/api/v1/extract",
            Some(json!({ "text": "Pasien demam" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = create_router(state)
        .oneshot(create_json_request("GET", "/metrics", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total_requests"], 1);
    assert_eq!(json["failed_requests"], 1);
    assert!(json["uptime_seconds"].is_u64());
}

// =============================================================================
// Extraction Tests
// =============================================================================

#[tokio::test]
async fn test_extract_returns_entities_in_order() {
    let app = app_with(FakeExtractor::Entities(sample_entities()));

    let response = app
        .oneshot(create_json_request(
            "POST",
            "/api/v1/extract",
            Some(json!({ "text": "Pasien dengan hemiparesis kanan" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["count"], 3);
    assert!(json["requestId"].is_string());
    assert!(json["processingTimeMs"].is_u64());

    let entities = json["entities"].as_array().unwrap();
    assert_eq!(entities[0]["text"], "hemiparesis");
    assert_eq!(entities[0]["snomedCode"], "50582007");
    assert_eq!(entities[0]["semanticCategory"], "disorder");
    assert_eq!(entities[1]["text"], "lemah");
    assert_eq!(entities[2]["confidenceScore"], "Medium");
}

#[tokio::test]
async fn test_extract_coded_only_filters() {
    let app = app_with(FakeExtractor::Entities(sample_entities()));

    let response = app
        .oneshot(create_json_request(
            "POST",
            "/api/v1/extract",
            Some(json!({ "text": "Pasien dengan hemiparesis", "codedOnly": true })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["entities"][0]["confidenceScore"], "High");
}

#[tokio::test]
async fn test_extract_empty_list() {
    let app = app_with(FakeExtractor::Entities(vec![]));

    let response = app
        .oneshot(create_json_request(
            "POST",
            "/api/v1/extract",
            Some(json!({ "text": "Tidak ada keluhan" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["count"], 0);
    assert_eq!(json["entities"], json!([]));
}

#[tokio::test]
async fn test_extract_blank_text() {
    let app = app_with(FakeExtractor::Entities(sample_entities()));

    let response = app
        .oneshot(create_json_request(
            "POST",
            "/api/v1/extract",
            Some(json!({ "text": "   \n" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_extract_text_too_long() {
    let mut config = AppConfig::default();
    config.server.max_text_chars = 10;
    let app = app_with_config(config, FakeExtractor::Entities(vec![]));

    let response = app
        .oneshot(create_json_request(
            "POST",
            "/api/v1/extract",
            Some(json!({ "text": "Pasien mengeluh nyeri dada" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_extract_transport_failure() {
    let app = app_with(FakeExtractor::Fails(|| {
        ExtractionError::Transport("Gemini API returned HTTP 503".to_string())
    }));

    let response = app
        .oneshot(create_json_request(
            "POST",
            "/api/v1/extract",
            Some(json!({ "text": "Pasien demam" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UPSTREAM_UNAVAILABLE");
    assert!(json["message"].as_str().unwrap().contains("HTTP 503"));
}

#[tokio::test]
async fn test_extract_payload_failure_localized() {
    let mut config = AppConfig::default();
    config.gemini.locale = Locale::Id;
    let app = app_with_config(
        config,
        FakeExtractor::Fails(|| ExtractionError::PayloadDecode("expected array".to_string())),
    );

    let response = app
        .oneshot(create_json_request(
            "POST",
            "/api/v1/extract",
            Some(json!({ "text": "Pasien demam" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UPSTREAM_PAYLOAD_ERROR");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .starts_with("Gagal mendekode JSON"));
}

#[tokio::test]
async fn test_extract_envelope_failure() {
    let app = app_with(FakeExtractor::Fails(|| {
        ExtractionError::EnvelopeShape("no candidates returned".to_string())
    }));

    let response = app
        .oneshot(create_json_request(
            "POST",
            "/api/v1/extract",
            Some(json!({ "text": "Pasien demam" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UPSTREAM_SHAPE_ERROR");
}

#[tokio::test]
async fn test_extract_without_credential() {
    let app = create_router(Arc::new(AppState::new(AppConfig::default())));

    let response = app
        .oneshot(create_json_request(
            "POST",
            "/api/v1/extract",
            Some(json!({ "text": "Pasien demam" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn test_extract_missing_text_field() {
    let app = app_with(FakeExtractor::Entities(vec![]));

    let response = app
        .oneshot(create_json_request(
            "POST",
            "/api/v1/extract",
            Some(json!({ "codedOnly": true })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["details"].as_str().unwrap().contains("text"));
}

#[tokio::test]
async fn test_extract_malformed_body() {
    let app = app_with(FakeExtractor::Entities(vec![]));

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/extract")
        .header("Content-Type", "application/json")
        .body(Body::from("{\"text\": \"Pasien demam"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["message"], "Invalid request body");
}
