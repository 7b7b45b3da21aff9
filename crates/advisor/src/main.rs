//! Learning advisor - learner analytics and study recommendations
//!
//! Loads the trained models once at startup and serves recommendations,
//! health, readiness and metrics over HTTP.

use advisor_lib::{
    health::HealthRegistry,
    observability::{AdvisorMetrics, StructuredLogger},
    recommendation::RecommendationEngine,
    registry::{RegistryConfig, SharedRegistry},
};
use anyhow::Result;
use learning_advisor::{api, config::AdvisorConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const ADVISOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let config = AdvisorConfig::load()?;

    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(fmt::layer().json())
        .init();

    info!(node_name = %config.node_name, "Starting learning-advisor");

    let logger = StructuredLogger::new(&config.node_name);
    let metrics = AdvisorMetrics::new();

    // Load every model once; failures leave the model absent
    let models = SharedRegistry::new(RegistryConfig::new(&config.artifacts_dir));
    let registry = models.get();
    for outcome in registry.load_report() {
        let path = outcome
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        match (outcome.error(), registry.get(&outcome.name)) {
            (None, Some(artifact)) => logger.log_model_loaded(
                &outcome.name,
                &path,
                artifact.accuracy(),
                artifact.feature_schema().len(),
            ),
            (Some(e), _) => {
                metrics.inc_model_load_failures();
                logger.log_model_load_failed(&outcome.name, &path, e.kind(), &e.to_string());
            }
            (None, None) => {}
        }
    }
    metrics.set_models_loaded(registry.len() as i64);

    let health_registry = HealthRegistry::new();
    health_registry.record_registry(&registry).await;

    let engine = Arc::new(RecommendationEngine::new(registry.clone()).with_logger(logger.clone()));
    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics.clone(),
        engine,
    ));

    logger.log_startup(
        ADVISOR_VERSION,
        &config.artifacts_dir.display().to_string(),
        registry.len(),
    );

    // Mark advisor as ready after initialization
    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = api_handle => {
            result??;
            logger.log_shutdown("API server stopped");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }
    info!("Shutting down");

    Ok(())
}
