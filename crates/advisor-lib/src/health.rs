//! Health check infrastructure for the learning advisor
//!
//! Tracks the health of the model registry and the recommender and reports
//! it for liveness and readiness probes.

use crate::models::ModelKind;
use crate::registry::ModelRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Component is functioning normally
    Healthy,
    /// Component is experiencing issues but still operational
    Degraded,
    /// Component has failed
    Unhealthy,
}

impl ComponentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::Healthy => "healthy",
            ComponentStatus::Degraded => "degraded",
            ComponentStatus::Unhealthy => "unhealthy",
        }
    }

    /// Returns true if the component is at least partially operational
    pub fn is_operational(&self) -> bool {
        matches!(self, ComponentStatus::Healthy | ComponentStatus::Degraded)
    }
}

/// Information about a component's health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    pub fn healthy() -> Self {
        Self {
            status: ComponentStatus::Healthy,
            message: None,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            status: ComponentStatus::Degraded,
            message: Some(message.into()),
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: ComponentStatus::Unhealthy,
            message: Some(message.into()),
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Compute overall status from component statuses
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        let mut has_degraded = false;
        
        for health in components.values() {
            match health.status {
                ComponentStatus::Unhealthy => return ComponentStatus::Unhealthy,
                ComponentStatus::Degraded => has_degraded = true,
                ComponentStatus::Healthy => {}
            }
        }
        
        if has_degraded {
            ComponentStatus::Degraded
        } else {
            ComponentStatus::Healthy
        }
    }
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names for health tracking
pub mod components {
    pub const MODEL_REGISTRY: &str = "model_registry";
    pub const RECOMMENDER: &str = "recommender";
}

/// Models the recommender cannot work without
const RECOMMENDER_MODELS: [ModelKind; 2] =
    [ModelKind::LearnerClassification, ModelKind::EngagementAnalysis];

/// Registry health from its load report.
///
/// Healthy when every model loaded, degraded when some did, unhealthy when
/// none did.
pub fn assess_registry(registry: &ModelRegistry) -> ComponentHealth {
    let failed: Vec<&str> = registry
        .load_report()
        .iter()
        .filter(|o| !o.is_loaded())
        .map(|o| o.name.as_str())
        .collect();

    if registry.is_empty() {
        ComponentHealth::unhealthy("No models loaded")
    } else if failed.is_empty() {
        ComponentHealth::healthy()
    } else {
        ComponentHealth::degraded(format!("Models unavailable: {}", failed.join(", ")))
    }
}

/// Recommender health: degraded while a model it needs is missing
pub fn assess_recommender(registry: &ModelRegistry) -> ComponentHealth {
    let missing: Vec<&str> = RECOMMENDER_MODELS
        .iter()
        .filter(|kind| !registry.contains(**kind))
        .map(|kind| kind.name())
        .collect();

    if missing.is_empty() {
        ComponentHealth::healthy()
    } else {
        ComponentHealth::degraded(format!(
            "Recommendations unavailable, missing: {}",
            missing.join(", ")
        ))
    }
}

/// Health registry for tracking component health
#[derive(Debug, Clone)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self {
            components: Arc::new(RwLock::new(HashMap::new())),
            ready: Arc::new(RwLock::new(false)),
        }
    }

    /// Record registry and recommender health for a freshly loaded registry
    pub async fn record_registry(&self, registry: &ModelRegistry) {
        self.update(components::MODEL_REGISTRY, assess_registry(registry))
            .await;
        self.update(components::RECOMMENDER, assess_recommender(registry))
            .await;
    }

    /// Update component health status
    pub async fn update(&self, name: &str, health: ComponentHealth) {
        let mut components = self.components.write().await;
        components.insert(name.to_string(), health);
    }

    /// Set readiness status
    pub async fn set_ready(&self, ready: bool) {
        let mut r = self.ready.write().await;
        *r = ready;
    }

    /// Get health response
    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse { status, components }
    }

    /// Get readiness response
    pub async fn readiness(&self) -> ReadinessResponse {
        let ready = *self.ready.read().await;
        let health = self.health().await;
        
        let critical_healthy = health.status != ComponentStatus::Unhealthy;
        
        if !ready {
            ReadinessResponse {
                ready: false,
                reason: Some("Advisor not yet initialized".to_string()),
            }
        } else if !critical_healthy {
            ReadinessResponse {
                ready: false,
                reason: Some("Critical component unhealthy".to_string()),
            }
        } else {
            ReadinessResponse {
                ready: true,
                reason: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ModelArtifact;
    use crate::pipeline::{LinearSpec, LogisticRegression};
    use crate::predictor::FeatureSchema;

    fn artifact(kind: ModelKind) -> ModelArtifact {
        let spec = LinearSpec {
            classes: vec!["a".to_string(), "b".to_string()],
            coef: vec![vec![1.0]],
            intercept: vec![0.0],
        };
        ModelArtifact::new(
            kind.name(),
            Box::new(LogisticRegression::new(&spec).unwrap()),
            FeatureSchema::new(vec!["accuracy".to_string()]).unwrap(),
            spec.classes.clone(),
            0.8,
        )
    }

    #[tokio::test]
    async fn test_health_registry_initial_state() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn test_health_registry_component_update() {
        let registry = HealthRegistry::new();
        registry
            .update(components::MODEL_REGISTRY, ComponentHealth::healthy())
            .await;

        let health = registry.health().await;
        assert!(health.components.contains_key(components::MODEL_REGISTRY));
        assert_eq!(
            health.components[components::MODEL_REGISTRY].status,
            ComponentStatus::Healthy
        );
    }

    #[tokio::test]
    async fn test_health_registry_degraded_status() {
        let registry = HealthRegistry::new();
        registry
            .update(components::MODEL_REGISTRY, ComponentHealth::healthy())
            .await;
        registry
            .update(
                components::RECOMMENDER,
                ComponentHealth::degraded("engagement model missing"),
            )
            .await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
    }

    #[tokio::test]
    async fn test_readiness_not_ready_initially() {
        let registry = HealthRegistry::new();
        let readiness = registry.readiness().await;

        assert!(!readiness.ready);
        assert!(readiness.reason.is_some());
    }

    #[tokio::test]
    async fn test_readiness_not_ready_when_unhealthy() {
        let registry = HealthRegistry::new();
        registry.set_ready(true).await;
        registry
            .update(
                components::MODEL_REGISTRY,
                ComponentHealth::unhealthy("No models loaded"),
            )
            .await;

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
    }

    #[tokio::test]
    async fn test_record_registry_with_every_model() {
        let models = ModelRegistry::from_artifacts(ModelKind::ALL.map(artifact));
        let health = HealthRegistry::new();
        health.record_registry(&models).await;
        health.set_ready(true).await;

        assert_eq!(health.health().await.status, ComponentStatus::Healthy);
        assert!(health.readiness().await.ready);
    }

    #[test]
    fn test_assess_empty_registry() {
        let models = ModelRegistry::default();
        assert_eq!(assess_registry(&models).status, ComponentStatus::Unhealthy);
        assert_eq!(assess_recommender(&models).status, ComponentStatus::Degraded);
    }

    #[test]
    fn test_recommender_degraded_without_engagement_model() {
        let models = ModelRegistry::from_artifacts([
            artifact(ModelKind::LearnerClassification),
            artifact(ModelKind::PerformancePrediction),
        ]);
        let health = assess_recommender(&models);
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert!(health.message.unwrap().contains("engagement-analysis"));
    }

    #[test]
    fn test_registry_degraded_on_partial_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let record = serde_json::json!({
            "pipeline": {"classifier": {"kind": "logistic_regression",
                "classes": ["a", "b"], "coef": [[1.0]], "intercept": [0.0]}},
            "feature_names": ["accuracy"]
        });
        std::fs::write(
            dir.path().join(ModelKind::PerformancePrediction.artifact_file()),
            record.to_string(),
        )
        .unwrap();
        let models =
            ModelRegistry::load(&crate::registry::RegistryConfig::new(dir.path()));
        assert_eq!(assess_registry(&models).status, ComponentStatus::Degraded);
    }
}
