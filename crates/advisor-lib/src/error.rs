//! Error types for loading, feature building, inference and recommendation.
//!
//! Load-time errors are recovered per model by the registry. Everything
//! else propagates to the caller so the presentation layer can show an
//! honest "no recommendation" message instead of a fabricated one.

use crate::models::ModelKind;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to read a model artifact from disk.
#[derive(Debug, Clone, Error)]
pub enum ArtifactError {
    /// Nothing exists at the artifact location.
    #[error("artifact not found at {}", path.display())]
    Missing { path: PathBuf },

    /// The bytes could not be decoded, strictly or with the fallback encoding.
    #[error("artifact at {} is corrupt: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// The decoded record does not describe a usable pipeline.
    #[error("artifact at {} has an invalid schema: {reason}", path.display())]
    SchemaInvalid { path: PathBuf, reason: String },
}

impl ArtifactError {
    /// Short machine-readable kind for logs and API responses
    pub fn kind(&self) -> &'static str {
        match self {
            ArtifactError::Missing { .. } => "artifact_missing",
            ArtifactError::Corrupt { .. } => "artifact_corrupt",
            ArtifactError::SchemaInvalid { .. } => "schema_invalid",
        }
    }
}

/// Failure to turn a feature map into a numeric vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// A present value could not be coerced to a float.
    #[error("feature `{name}` has a non-numeric value: {value}")]
    TypeInvalid { name: String, value: String },
}

/// Failure inside a pipeline while scoring one vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("expected {expected} input features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("pipeline has not been fitted")]
    NotFitted,

    #[error("{0}")]
    Runtime(String),
}

/// Underlying reason a prediction could not be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionCause {
    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error("feature `{name}` is not finite")]
    NonFiniteInput { name: String },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("invalid probability distribution: {0}")]
    InvalidDistribution(String),

    #[error("expected a binary model, found {0} classes")]
    NotBinary(usize),
}

/// A model failed to score a learner. No partial prediction is ever returned.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("prediction with model `{model}` failed: {cause}")]
pub struct PredictionError {
    pub model: String,
    #[source]
    pub cause: PredictionCause,
}

impl PredictionError {
    pub fn new(model: impl Into<String>, cause: impl Into<PredictionCause>) -> Self {
        Self {
            model: model.into(),
            cause: cause.into(),
        }
    }
}

/// No recommendation is available for the learner.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecommendationError {
    #[error("model `{0}` is not loaded")]
    ModelUnavailable(ModelKind),

    #[error(transparent)]
    PredictionFailed(#[from] PredictionError),

    #[error("model `{model}` produced unexpected label `{label}`")]
    UnexpectedLabel { model: ModelKind, label: String },
}

impl RecommendationError {
    pub fn code(&self) -> &'static str {
        "recommendation_unavailable"
    }
}
