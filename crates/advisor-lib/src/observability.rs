//! Observability infrastructure for the learning advisor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, loaded models, recommendation outcomes)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for inference latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AdvisorMetricsInner> = OnceLock::new();

struct AdvisorMetricsInner {
    prediction_latency_seconds: HistogramVec,
    models_loaded: IntGauge,
    model_load_failures: IntCounter,
    predictions: IntCounterVec,
    prediction_errors: IntCounterVec,
    recommendations_generated: IntCounter,
    recommendations_unavailable: IntCounter,
}

impl AdvisorMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram_vec!(
                "learning_advisor_prediction_latency_seconds",
                "Time spent running one model on one learner",
                &["model"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            models_loaded: register_int_gauge!(
                "learning_advisor_models_loaded",
                "Number of models currently held by the registry"
            )
            .expect("Failed to register models_loaded"),

            model_load_failures: register_int_counter!(
                "learning_advisor_model_load_failures_total",
                "Total number of model artifacts that failed to load"
            )
            .expect("Failed to register model_load_failures"),

            predictions: register_int_counter_vec!(
                "learning_advisor_predictions_total",
                "Total number of successful predictions",
                &["model"]
            )
            .expect("Failed to register predictions"),

            prediction_errors: register_int_counter_vec!(
                "learning_advisor_prediction_errors_total",
                "Total number of failed predictions",
                &["model"]
            )
            .expect("Failed to register prediction_errors"),

            recommendations_generated: register_int_counter!(
                "learning_advisor_recommendations_generated_total",
                "Total number of recommendations produced"
            )
            .expect("Failed to register recommendations_generated"),

            recommendations_unavailable: register_int_counter!(
                "learning_advisor_recommendations_unavailable_total",
                "Total number of requests that could not be given a recommendation"
            )
            .expect("Failed to register recommendations_unavailable"),
        }
    }
}

/// Advisor metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Debug, Clone)]
pub struct AdvisorMetrics {
    _private: (),
}

impl Default for AdvisorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvisorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AdvisorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AdvisorMetricsInner {
        GLOBAL_METRICS.get_or_init(AdvisorMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, model: &str, duration_secs: f64) {
        self.inner()
            .prediction_latency_seconds
            .with_label_values(&[model])
            .observe(duration_secs);
    }

    pub fn set_models_loaded(&self, count: i64) {
        self.inner().models_loaded.set(count);
    }

    pub fn inc_model_load_failures(&self) {
        self.inner().model_load_failures.inc();
    }

    pub fn inc_predictions(&self, model: &str) {
        self.inner().predictions.with_label_values(&[model]).inc();
    }

    pub fn inc_prediction_errors(&self, model: &str) {
        self.inner().prediction_errors.with_label_values(&[model]).inc();
    }

    pub fn inc_recommendations_generated(&self) {
        self.inner().recommendations_generated.inc();
    }

    pub fn inc_recommendations_unavailable(&self) {
        self.inner().recommendations_unavailable.inc();
    }

    /// Render the default registry in Prometheus text format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Structured logger for advisor events
///
/// Emits consistently named events for model loading and recommendation
/// outcomes so they can be filtered in the JSON log stream.
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    node_name: String,
}

impl Default for StructuredLogger {
    fn default() -> Self {
        Self::new("local")
    }
}

impl StructuredLogger {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Log advisor startup
    pub fn log_startup(&self, version: &str, artifacts_dir: &str, models_loaded: usize) {
        info!(
            event = "advisor_started",
            node = %self.node_name,
            advisor_version = %version,
            artifacts_dir = %artifacts_dir,
            models_loaded = models_loaded,
            "Learning advisor started"
        );
    }

    pub fn log_model_loaded(&self, model: &str, path: &str, accuracy: f64, feature_count: usize) {
        info!(
            event = "model_loaded",
            node = %self.node_name,
            model = %model,
            path = %path,
            accuracy = accuracy,
            feature_count = feature_count,
            "Model available"
        );
    }

    pub fn log_model_load_failed(&self, model: &str, path: &str, kind: &str, error: &str) {
        warn!(
            event = "model_load_failed",
            node = %self.node_name,
            model = %model,
            path = %path,
            kind = %kind,
            error = %error,
            "Model could not be loaded, continuing without it"
        );
    }

    pub fn log_recommendation(
        &self,
        learner_type: &str,
        learner_confidence: f64,
        engagement_level: &str,
        engagement_confidence: f64,
    ) {
        info!(
            event = "recommendation_generated",
            node = %self.node_name,
            learner_type = %learner_type,
            learner_confidence = learner_confidence,
            engagement_level = %engagement_level,
            engagement_confidence = engagement_confidence,
            "Generated learning recommendation"
        );
    }

    pub fn log_recommendation_unavailable(&self, reason: &str) {
        warn!(
            event = "recommendation_unavailable",
            node = %self.node_name,
            reason = %reason,
            "No recommendation available"
        );
    }

    /// Log advisor shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "advisor_shutdown",
            node = %self.node_name,
            reason = %reason,
            "Learning advisor shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisor_metrics_creation() {
        let metrics = AdvisorMetrics::new();

        metrics.observe_prediction_latency("learner-classification", 0.0002);
        metrics.set_models_loaded(3);
        metrics.inc_model_load_failures();
        metrics.inc_predictions("learner-classification");
        metrics.inc_prediction_errors("engagement-analysis");
        metrics.inc_recommendations_generated();
        metrics.inc_recommendations_unavailable();
    }

    #[test]
    fn test_render_includes_registered_metrics() {
        let metrics = AdvisorMetrics::new();
        metrics.set_models_loaded(2);
        let text = metrics.render().unwrap();
        assert!(text.contains("learning_advisor_models_loaded"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-node");
        assert_eq!(logger.node_name(), "test-node");
        assert_eq!(StructuredLogger::default().node_name(), "local");
    }
}
