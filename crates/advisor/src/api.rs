//! HTTP API for health checks, Prometheus metrics and recommendations

use advisor_lib::{
    health::{ComponentStatus, HealthRegistry},
    models::{AdaptiveReport, StudentFeatures},
    observability::AdvisorMetrics,
    predictor::{QuestionOutcome, SessionFeatureExtractor},
    recommendation::RecommendationEngine,
    registry::ModelInfo,
    RecommendationError,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: AdvisorMetrics,
    pub engine: Arc<RecommendationEngine>,
    pub extractor: SessionFeatureExtractor,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: AdvisorMetrics,
        engine: Arc<RecommendationEngine>,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            engine,
            extractor: SessionFeatureExtractor::new(),
        }
    }
}

/// Error body returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Errors surfaced by API handlers
#[derive(Debug)]
pub enum ApiError {
    Unavailable(RecommendationError),
    BadRequest(String),
    Internal(String),
}

impl From<RecommendationError> for ApiError {
    fn from(e: RecommendationError) -> Self {
        ApiError::Unavailable(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unavailable(e) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    error: "No recommendation is available for this learner".to_string(),
                    code: e.code().to_string(),
                    details: Some(e.to_string()),
                },
            ),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: message,
                    code: "bad_request".to_string(),
                    details: None,
                },
            ),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: message,
                    code: "internal".to_string(),
                    details: None,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Models known to the registry
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub available: BTreeSet<String>,
    pub models: Vec<ModelInfo>,
}

/// Raw quiz telemetry for one session
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionRequest {
    pub outcomes: Vec<QuestionOutcome>,
    /// Accuracy of every session so far, oldest first, current last
    #[serde(default)]
    pub history: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub features: StudentFeatures,
    pub report: AdaptiveReport,
}

/// Health check response - 200 while operational, 503 when unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = if health.status.is_operational() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let text = state.metrics.render().map_err(|e| {
        error!(error = %e, "Failed to encode metrics");
        ApiError::Internal("failed to encode metrics".to_string())
    })?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        text,
    ))
}

async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    let registry = state.engine.registry();
    Json(ModelsResponse {
        available: registry.available_names(),
        models: registry.model_info(),
    })
}

async fn recommend(
    State(state): State<Arc<AppState>>,
    Json(features): Json<StudentFeatures>,
) -> Result<Json<AdaptiveReport>, ApiError> {
    let report = state.engine.analyze(&features)?;
    Ok(Json(report))
}

async fn analyze_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let features = state
        .extractor
        .extract(&request.outcomes, &request.history)
        .ok_or_else(|| ApiError::BadRequest("session has no answered questions".to_string()))?;

    let report = state.engine.analyze(&features)?;
    Ok(Json(SessionResponse { features, report }))
}

async fn predict_performance(
    State(state): State<Arc<AppState>>,
    Json(features): Json<StudentFeatures>,
) -> Result<impl IntoResponse, ApiError> {
    let estimate = state.engine.predict_performance(&features)?;
    Ok(Json(estimate))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/models", get(list_models))
        .route("/api/v1/recommendations", post(recommend))
        .route("/api/v1/sessions/analyze", post(analyze_session))
        .route("/api/v1/predictions/performance", post(predict_performance))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
