//! ML prediction engine

mod features;
mod inference;
mod session;

pub use features::{build_feature_vector, FeatureSchema, FeatureVectorBuilder, DEFAULT_SCHEMA_VERSION};
pub use inference::{InferenceStats, Predictor};
pub use session::{QuestionOutcome, SessionFeatureExtractor, MIN_OUTCOMES};
