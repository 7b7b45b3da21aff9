//! Fitted inference pipelines
//!
//! An artifact's `pipeline` field describes a fitted classifier, optionally
//! preceded by a standard-scaling step. Pipelines map one feature vector to
//! a probability distribution over their own class ordering.

mod linear;
mod onnx;
mod tree;

pub use linear::{LinearSpec, LogisticRegression};
pub use onnx::{OnnxPipeline, OnnxSpec};
pub use tree::{BoostingSpec, ForestSpec, GradientBoosting, NodeSpec, RandomForest, TreeSpec};

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// A fitted model that produces class probabilities
pub trait Pipeline: Send + Sync + fmt::Debug {
    /// Class labels, in the order `predict_proba` reports them
    fn classes(&self) -> &[String];

    /// Number of input columns, when the pipeline declares it
    fn n_features(&self) -> Option<usize>;

    /// Score one row
    fn predict_proba(&self, input: &[f64]) -> Result<Vec<f64>, PipelineError>;
}

/// Reasons a pipeline description cannot be turned into a runnable pipeline
#[derive(Debug, Error)]
pub enum BuildError {
    /// The description is inconsistent (dimensions, tree links, ...)
    #[error("{0}")]
    Invalid(String),

    /// An external graph referenced by the description could not be read
    #[error("{0}")]
    Unreadable(String),
}

/// Serialized form of a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    #[serde(default)]
    pub scaler: Option<ScalerSpec>,
    pub classifier: ClassifierSpec,
}

/// Serialized classifier, tagged by `kind`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierSpec {
    LogisticRegression(LinearSpec),
    RandomForest(ForestSpec),
    GradientBoosting(BoostingSpec),
    Onnx(OnnxSpec),
}

impl PipelineSpec {
    /// Build a runnable pipeline.
    ///
    /// `base_dir` resolves relative paths of external graphs and
    /// `n_features_hint` is the width of the artifact's feature schema,
    /// used when the classifier does not declare its own.
    pub fn build(
        &self,
        base_dir: &Path,
        n_features_hint: usize,
    ) -> Result<Box<dyn Pipeline>, BuildError> {
        let classifier: Box<dyn Pipeline> = match &self.classifier {
            ClassifierSpec::LogisticRegression(spec) => Box::new(LogisticRegression::new(spec)?),
            ClassifierSpec::RandomForest(spec) => Box::new(RandomForest::new(spec)?),
            ClassifierSpec::GradientBoosting(spec) => Box::new(GradientBoosting::new(spec)?),
            ClassifierSpec::Onnx(spec) => {
                Box::new(OnnxPipeline::load(spec, base_dir, n_features_hint)?)
            }
        };

        match &self.scaler {
            None => Ok(classifier),
            Some(spec) => {
                let scaler = StandardScaler::new(spec)?;
                if let Some(width) = classifier.n_features() {
                    if width != scaler.len() {
                        return Err(BuildError::Invalid(format!(
                            "scaler has {} columns but classifier expects {}",
                            scaler.len(),
                            width
                        )));
                    }
                }
                Ok(Box::new(Scaled {
                    scaler,
                    inner: classifier,
                }))
            }
        }
    }
}

/// Serialized standard-scaling step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerSpec {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Centers and scales each column: `(x - mean) / scale`
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(spec: &ScalerSpec) -> Result<Self, BuildError> {
        if spec.mean.len() != spec.scale.len() {
            return Err(BuildError::Invalid(format!(
                "scaler mean has {} columns but scale has {}",
                spec.mean.len(),
                spec.scale.len()
            )));
        }
        // Zero-variance columns are stored with scale 0 by some exporters
        let scale = spec
            .scale
            .iter()
            .map(|s| if *s == 0.0 { 1.0 } else { *s })
            .collect();
        Ok(Self {
            mean: spec.mean.clone(),
            scale,
        })
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn transform(&self, input: &[f64]) -> Result<Vec<f64>, PipelineError> {
        if input.len() != self.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.len(),
                actual: input.len(),
            });
        }
        Ok(input
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }
}

/// Scaler followed by a classifier
#[derive(Debug)]
struct Scaled {
    scaler: StandardScaler,
    inner: Box<dyn Pipeline>,
}

impl Pipeline for Scaled {
    fn classes(&self) -> &[String] {
        self.inner.classes()
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.scaler.len())
    }

    fn predict_proba(&self, input: &[f64]) -> Result<Vec<f64>, PipelineError> {
        let scaled = self.scaler.transform(input)?;
        self.inner.predict_proba(&scaled)
    }
}

/// Class labels as written by the training job: strings, or the raw
/// integer/boolean targets a binary model was fitted on. `null` reads as
/// no labels.
pub(crate) fn deserialize_labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    Option::<Vec<Value>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .map(|label| match label {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(D::Error::custom(format!("invalid class label {}", other))),
        })
        .collect()
}

/// A list field that may be absent or `null`
pub(crate) fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Logistic function
pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Numerically stable softmax
pub(crate) fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Turn raw decision scores into probabilities: one score is a binary
/// logit for the second class, several scores are a softmax.
pub(crate) fn scores_to_proba(scores: &[f64]) -> Vec<f64> {
    if scores.len() == 1 {
        let p = sigmoid(scores[0]);
        vec![1.0 - p, p]
    } else {
        softmax(scores)
    }
}

/// Number of decision scores a classifier over `n_classes` produces
pub(crate) fn score_count(n_classes: usize) -> usize {
    if n_classes == 2 {
        1
    } else {
        n_classes
    }
}
