//! Single-model inference
//!
//! Runs one artifact's pipeline on one learner and reduces the class
//! distribution to its top class.

use super::FeatureVectorBuilder;
use crate::artifact::ModelArtifact;
use crate::error::{PipelineError, PredictionCause, PredictionError};
use crate::models::{Prediction, StudentFeatures, SuccessEstimate};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, warn};

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

/// Probabilities may drift from 1.0 by float error, not more
const DISTRIBUTION_TOLERANCE: f64 = 1e-3;

/// Applies model pipelines to learner features
#[derive(Debug, Default)]
pub struct Predictor {
    inference_count: AtomicU64,
    failure_count: AtomicU64,
    slow_inference_count: AtomicU64,
}

impl Predictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top class and its probability.
    ///
    /// When several classes share the maximum probability the first one in
    /// the pipeline's class order wins. That order comes from the training
    /// framework, so ties resolve the way the trained model would.
    pub fn predict(
        &self,
        artifact: &ModelArtifact,
        features: &StudentFeatures,
    ) -> Result<Prediction, PredictionError> {
        let (classes, proba) = self.distribution(artifact, features)?;
        let (idx, confidence) = argmax(&proba);
        Ok(Prediction {
            label: classes[idx].clone(),
            confidence,
        })
    }

    /// Probability of the positive (second) class of a binary model
    pub fn predict_success(
        &self,
        artifact: &ModelArtifact,
        features: &StudentFeatures,
    ) -> Result<SuccessEstimate, PredictionError> {
        let (classes, proba) = self.distribution(artifact, features)?;
        if classes.len() != 2 {
            return Err(self.fail(artifact, PredictionCause::NotBinary(classes.len())));
        }
        let success_probability = proba[1];
        Ok(SuccessEstimate {
            success_probability,
            predicted_success: success_probability > 0.5,
        })
    }

    /// Validated class distribution, aligned with the pipeline's classes
    fn distribution<'a>(
        &self,
        artifact: &'a ModelArtifact,
        features: &StudentFeatures,
    ) -> Result<(&'a [String], Vec<f64>), PredictionError> {
        let start = Instant::now();
        let schema = artifact.feature_schema();

        let input = FeatureVectorBuilder::new(schema)
            .build(features)
            .map_err(|e| self.fail(artifact, e))?;

        if let Some(pos) = input.iter().position(|v| !v.is_finite()) {
            let name = schema.names()[pos].clone();
            return Err(self.fail(artifact, PredictionCause::NonFiniteInput { name }));
        }

        let pipeline = artifact.pipeline();
        if let Some(expected) = pipeline.n_features() {
            if expected != input.len() {
                let cause = PipelineError::DimensionMismatch {
                    expected,
                    actual: input.len(),
                };
                return Err(self.fail(artifact, cause));
            }
        }

        let proba = pipeline
            .predict_proba(&input)
            .map_err(|e| self.fail(artifact, e))?;
        let classes = pipeline.classes();
        if let Err(reason) = check_distribution(&proba, classes.len()) {
            return Err(self.fail(artifact, PredictionCause::InvalidDistribution(reason)));
        }

        let elapsed = start.elapsed();
        self.inference_count.fetch_add(1, Ordering::Relaxed);
        if elapsed.as_millis() > MAX_INFERENCE_MS {
            self.slow_inference_count.fetch_add(1, Ordering::Relaxed);
            warn!(
                model = %artifact.name(),
                elapsed_ms = elapsed.as_millis(),
                "Inference exceeded {}ms target",
                MAX_INFERENCE_MS
            );
        } else {
            debug!(model = %artifact.name(), elapsed_us = elapsed.as_micros(), "Inference completed");
        }

        Ok((classes, proba))
    }

    fn fail(&self, artifact: &ModelArtifact, cause: impl Into<PredictionCause>) -> PredictionError {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
        let err = PredictionError::new(artifact.name(), cause);
        debug!(model = %artifact.name(), error = %err.cause, "Prediction failed");
        err
    }

    /// Get inference statistics
    pub fn stats(&self) -> InferenceStats {
        InferenceStats {
            total_inferences: self.inference_count.load(Ordering::Relaxed),
            failed_inferences: self.failure_count.load(Ordering::Relaxed),
            slow_inferences: self.slow_inference_count.load(Ordering::Relaxed),
        }
    }
}

/// Inference statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceStats {
    pub total_inferences: u64,
    pub failed_inferences: u64,
    pub slow_inferences: u64,
}

fn check_distribution(proba: &[f64], n_classes: usize) -> Result<(), String> {
    if proba.len() != n_classes {
        return Err(format!(
            "{} probabilities for {} classes",
            proba.len(),
            n_classes
        ));
    }
    if proba.iter().any(|p| !p.is_finite() || *p < 0.0 || *p > 1.0 + DISTRIBUTION_TOLERANCE) {
        return Err(format!("probabilities out of range: {:?}", proba));
    }
    let sum: f64 = proba.iter().sum();
    if (sum - 1.0).abs() > DISTRIBUTION_TOLERANCE {
        return Err(format!("probabilities sum to {}", sum));
    }
    Ok(())
}

/// First index holding the maximum value
fn argmax(values: &[f64]) -> (usize, f64) {
    let mut best = (0, values[0]);
    for (idx, value) in values.iter().enumerate().skip(1) {
        if *value > best.1 {
            best = (idx, *value);
        }
    }
    best
}
