//! Recommendation engine
//!
//! Runs the learner-classification and engagement-analysis models for one
//! learner and maps the pair of labels onto an advice bundle. Any missing
//! model, failed prediction or unknown label makes the whole request
//! unavailable; there is no fallback advice.

mod tables;

pub use tables::{difficulty_adjustment, motivation_tips, recommendation_for, study_plan, RESOURCES};

use crate::artifact::ModelArtifact;
use crate::error::RecommendationError;
use crate::models::{
    AdaptiveReport, EngagementLevel, LearnerType, ModelKind, Prediction, Recommendation,
    StudentFeatures, SuccessEstimate,
};
use crate::observability::{AdvisorMetrics, StructuredLogger};
use crate::predictor::{InferenceStats, Predictor};
use crate::registry::ModelRegistry;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

/// Produces recommendations from the models held by a registry
#[derive(Debug)]
pub struct RecommendationEngine {
    registry: Arc<ModelRegistry>,
    predictor: Predictor,
    metrics: AdvisorMetrics,
    logger: StructuredLogger,
}

impl RecommendationEngine {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            predictor: Predictor::new(),
            metrics: AdvisorMetrics::new(),
            logger: StructuredLogger::default(),
        }
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn inference_stats(&self) -> InferenceStats {
        self.predictor.stats()
    }

    /// Advice for the learner described by `features`
    pub fn recommend(
        &self,
        features: &StudentFeatures,
    ) -> Result<Recommendation, RecommendationError> {
        self.analyze(features).map(|report| report.recommendation)
    }

    /// Advice together with the two predictions it was derived from
    pub fn analyze(&self, features: &StudentFeatures) -> Result<AdaptiveReport, RecommendationError> {
        let outcome = self.predict_learner_type(features).and_then(|learner| {
            self.analyze_engagement(features)
                .map(|engagement| (learner, engagement))
        });

        match outcome {
            Ok(((learner_type, learner), (engagement_level, engagement))) => {
                self.metrics.inc_recommendations_generated();
                self.logger.log_recommendation(
                    learner_type.as_str(),
                    learner.confidence,
                    engagement_level.as_str(),
                    engagement.confidence,
                );
                Ok(AdaptiveReport {
                    learner_type,
                    engagement_level,
                    learner,
                    engagement,
                    recommendation: recommendation_for(learner_type, engagement_level),
                })
            }
            Err(e) => {
                self.metrics.inc_recommendations_unavailable();
                self.logger.log_recommendation_unavailable(&e.to_string());
                Err(e)
            }
        }
    }

    pub fn predict_learner_type(
        &self,
        features: &StudentFeatures,
    ) -> Result<(LearnerType, Prediction), RecommendationError> {
        self.classify(ModelKind::LearnerClassification, features)
    }

    pub fn analyze_engagement(
        &self,
        features: &StudentFeatures,
    ) -> Result<(EngagementLevel, Prediction), RecommendationError> {
        self.classify(ModelKind::EngagementAnalysis, features)
    }

    /// Likelihood that the learner answers the next question correctly
    pub fn predict_performance(
        &self,
        features: &StudentFeatures,
    ) -> Result<SuccessEstimate, RecommendationError> {
        let kind = ModelKind::PerformancePrediction;
        let artifact = self.artifact(kind)?;
        self.timed(artifact, |a| self.predictor.predict_success(a, features))
            .map_err(RecommendationError::from)
    }

    /// Predict with one model and parse its label into `T`
    fn classify<T: FromStr>(
        &self,
        kind: ModelKind,
        features: &StudentFeatures,
    ) -> Result<(T, Prediction), RecommendationError> {
        let artifact = self.artifact(kind)?;
        let prediction = self.timed(artifact, |a| self.predictor.predict(a, features))?;
        let label = prediction
            .label
            .parse::<T>()
            .map_err(|_| RecommendationError::UnexpectedLabel {
                model: kind,
                label: prediction.label.clone(),
            })?;
        Ok((label, prediction))
    }

    fn artifact(&self, kind: ModelKind) -> Result<&ModelArtifact, RecommendationError> {
        self.registry
            .get_kind(kind)
            .ok_or(RecommendationError::ModelUnavailable(kind))
    }

    fn timed<R, E>(
        &self,
        artifact: &ModelArtifact,
        run: impl FnOnce(&ModelArtifact) -> Result<R, E>,
    ) -> Result<R, E> {
        let start = Instant::now();
        let result = run(artifact);
        let model = artifact.name();
        match &result {
            Ok(_) => {
                self.metrics
                    .observe_prediction_latency(model, start.elapsed().as_secs_f64());
                self.metrics.inc_predictions(model);
            }
            Err(_) => self.metrics.inc_prediction_errors(model),
        }
        result
    }
}
