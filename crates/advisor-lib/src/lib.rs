//! Learner analytics core
//!
//! This crate provides the core functionality for:
//! - Reading trained model artifacts and holding them in a registry
//! - Building model inputs from loosely typed learner metrics
//! - Running inference and mapping predictions onto study advice
//! - Health checks and observability

pub mod artifact;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod predictor;
pub mod recommendation;
pub mod registry;

pub use artifact::ModelArtifact;
pub use error::{
    ArtifactError, FeatureError, PipelineError, PredictionCause, PredictionError,
    RecommendationError,
};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AdvisorMetrics, StructuredLogger};
pub use predictor::{FeatureSchema, Predictor, QuestionOutcome, SessionFeatureExtractor};
pub use recommendation::RecommendationEngine;
pub use registry::{ModelInfo, ModelRegistry, RegistryConfig, SharedRegistry};
