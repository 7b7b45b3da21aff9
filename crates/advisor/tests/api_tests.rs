//! Integration tests for the advisor API endpoints

use advisor_lib::{
    health::{components, HealthRegistry},
    models::ModelKind,
    observability::AdvisorMetrics,
    recommendation::RecommendationEngine,
    registry::{ModelRegistry, RegistryConfig},
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use learning_advisor::api::{create_router, AppState};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn write_artifact(dir: &Path, kind: ModelKind, record: Value) {
    std::fs::write(dir.join(kind.artifact_file()), record.to_string()).unwrap();
}

/// Small logistic models: accuracy drives the learner type, the engagement
/// score drives the engagement level.
fn write_all_artifacts(dir: &Path) {
    write_artifact(
        dir,
        ModelKind::LearnerClassification,
        json!({
            "pipeline": {"classifier": {
                "kind": "logistic_regression",
                "classes": ["advanced", "moderate", "struggling"],
                "coef": [[4.0], [0.0], [-4.0]],
                "intercept": [-2.0, 0.0, 2.0]
            }},
            "feature_names": ["accuracy"],
            "classes": ["advanced", "moderate", "struggling"],
            "accuracy": 0.9
        }),
    );
    write_artifact(
        dir,
        ModelKind::EngagementAnalysis,
        json!({
            "pipeline": {"classifier": {
                "kind": "logistic_regression",
                "classes": ["high", "low", "medium"],
                "coef": [[4.0], [-4.0], [0.0]],
                "intercept": [-2.0, 2.0, 0.0]
            }},
            "feature_names": ["engagement"],
            "accuracy": 0.85
        }),
    );
    write_artifact(
        dir,
        ModelKind::PerformancePrediction,
        json!({
            "pipeline": {
                "scaler": {"mean": [0.5], "scale": [0.25]},
                "classifier": {
                    "kind": "logistic_regression",
                    "classes": [0, 1],
                    "coef": [[1.0]],
                    "intercept": [0.0]
                }
            },
            "feature_names": ["accuracy"],
            "accuracy": 0.8
        }),
    );
}

async fn setup_app(dir: &Path) -> (Router, Arc<AppState>) {
    let registry = Arc::new(ModelRegistry::load(&RegistryConfig::new(dir)));
    let health_registry = HealthRegistry::new();
    health_registry.record_registry(&registry).await;

    let engine = Arc::new(RecommendationEngine::new(registry));
    let state = Arc::new(AppState::new(
        health_registry,
        AdvisorMetrics::new(),
        engine,
    ));
    (create_router(state.clone()), state)
}

async fn setup_full_app() -> (Router, Arc<AppState>, TempDir) {
    let dir = TempDir::new().unwrap();
    write_all_artifacts(dir.path());
    let (app, state) = setup_app(dir.path()).await;
    (app, state, dir)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn post_json(app: Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_healthz_returns_ok_when_all_models_loaded() {
    let (app, _state, _dir) = setup_full_app().await;

    let (status, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);

    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");
    assert!(health["components"][components::MODEL_REGISTRY].is_object());
    assert!(health["components"][components::RECOMMENDER].is_object());
}

#[tokio::test]
async fn test_healthz_returns_ok_when_degraded() {
    let dir = TempDir::new().unwrap();
    write_all_artifacts(dir.path());
    std::fs::remove_file(
        dir.path()
            .join(ModelKind::EngagementAnalysis.artifact_file()),
    )
    .unwrap();
    let (app, _state) = setup_app(dir.path()).await;

    let (status, body) = get(app, "/healthz").await;
    // Degraded still returns 200 (operational)
    assert_eq!(status, StatusCode::OK);

    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "degraded");
    assert_eq!(
        health["components"][components::RECOMMENDER]["status"],
        "degraded"
    );
}

#[tokio::test]
async fn test_healthz_returns_503_without_models() {
    let dir = TempDir::new().unwrap();
    let (app, _state) = setup_app(dir.path()).await;

    let (status, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "unhealthy");
}

#[tokio::test]
async fn test_readyz_returns_503_when_not_ready() {
    let (app, _state, _dir) = setup_full_app().await;

    let (status, body) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let readiness: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_readyz_returns_ok_when_ready() {
    let (app, state, _dir) = setup_full_app().await;
    state.health_registry.set_ready(true).await;

    let (status, body) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);

    let readiness: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_models_lists_loaded_and_failed() {
    let dir = TempDir::new().unwrap();
    write_all_artifacts(dir.path());
    std::fs::write(
        dir.path()
            .join(ModelKind::PerformancePrediction.artifact_file()),
        "[]",
    )
    .unwrap();
    let (app, _state) = setup_app(dir.path()).await;

    let (status, body) = get(app, "/api/v1/models").await;
    assert_eq!(status, StatusCode::OK);

    let models: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        models["available"],
        json!(["engagement-analysis", "learner-classification"])
    );
    let performance = models["models"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["name"] == "performance-prediction")
        .unwrap();
    assert_eq!(performance["loaded"], false);
    assert!(performance["error"].as_str().unwrap().contains("invalid schema"));
}

#[tokio::test]
async fn test_recommendation_for_perfect_score() {
    let (app, _state, _dir) = setup_full_app().await;

    let (status, report) = post_json(
        app,
        "/api/v1/recommendations",
        json!({"accuracy": 1.0, "engagement": 1.0, "consistency": 1.0}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["learner_type"], "advanced");
    assert_eq!(report["engagement_level"], "high");
    assert_eq!(
        report["recommendation"]["difficulty_adjustment"],
        "Increase difficulty to maintain engagement"
    );
    assert_eq!(
        report["recommendation"]["motivation_tips"][0],
        "Maintain your excellent momentum!"
    );
    assert_eq!(
        report["recommendation"]["resources"].as_array().unwrap().len(),
        4
    );
}

#[tokio::test]
async fn test_recommendation_unavailable_without_models() {
    let dir = TempDir::new().unwrap();
    let (app, _state) = setup_app(dir.path()).await;

    let (status, body) = post_json(app, "/api/v1/recommendations", json!({"accuracy": 0.4})).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "recommendation_unavailable");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("learner-classification"));
}

#[tokio::test]
async fn test_recommendation_unavailable_for_non_numeric_feature() {
    let (app, _state, _dir) = setup_full_app().await;

    let (status, body) = post_json(
        app,
        "/api/v1/recommendations",
        json!({"accuracy": "excellent"}),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["details"].as_str().unwrap().contains("accuracy"));
}

#[tokio::test]
async fn test_session_analysis_derives_features() {
    let (app, _state, _dir) = setup_full_app().await;

    let outcomes: Vec<Value> = (0..5)
        .map(|_| json!({"correct": true, "time_seconds": 20.0, "attempts": 1}))
        .collect();
    let (status, body) = post_json(
        app,
        "/api/v1/sessions/analyze",
        json!({"outcomes": outcomes, "history": [0.6, 0.8, 1.0]}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["features"]["accuracy"], 1.0);
    assert_eq!(body["features"]["engagement"], 1.0);
    assert_eq!(body["features"]["total_attempts"], 3);
    assert_eq!(body["report"]["learner_type"], "advanced");
    assert_eq!(body["report"]["engagement_level"], "high");
}

#[tokio::test]
async fn test_session_analysis_rejects_empty_session() {
    let (app, _state, _dir) = setup_full_app().await;

    let (status, body) = post_json(app, "/api/v1/sessions/analyze", json!({"outcomes": []})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}

#[tokio::test]
async fn test_performance_prediction() {
    let (app, _state, _dir) = setup_full_app().await;

    let (status, body) = post_json(
        app,
        "/api/v1/predictions/performance",
        json!({"accuracy": 1.0}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_success"], true);
    assert!(body["success_probability"].as_f64().unwrap() > 0.5);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _state, _dir) = setup_full_app().await;

    let (status, _) = post_json(
        app.clone(),
        "/api/v1/recommendations",
        json!({"accuracy": 0.5, "engagement": 0.5}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("learning_advisor_recommendations_generated_total"));
    assert!(metrics_text.contains("learning_advisor_predictions_total"));
    assert!(metrics_text.contains("learning_advisor_prediction_latency_seconds_bucket"));
}
