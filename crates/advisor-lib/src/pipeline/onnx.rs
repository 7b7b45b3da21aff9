//! ONNX pipelines run with tract
//!
//! Lets the training job export its fitted pipeline as an ONNX graph
//! stored next to the artifact, instead of a native tree/linear description.

use super::{BuildError, Pipeline};
use crate::error::PipelineError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Serialized reference to an ONNX graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnnxSpec {
    #[serde(default, deserialize_with = "super::deserialize_labels")]
    pub classes: Vec<String>,
    /// Graph location, relative to the artifact's directory
    pub path: PathBuf,
    /// Input width; defaults to the artifact's feature count
    #[serde(default)]
    pub n_features: Option<usize>,
    /// Index of the probability tensor among the graph outputs
    #[serde(default = "default_probability_output")]
    pub probability_output: usize,
}

fn default_probability_output() -> usize {
    1
}

pub struct OnnxPipeline {
    model: TractModel,
    classes: Vec<String>,
    n_features: usize,
    probability_output: usize,
    path: PathBuf,
}

impl OnnxPipeline {
    pub fn load(spec: &OnnxSpec, base_dir: &Path, n_features_hint: usize) -> Result<Self, BuildError> {
        let n_features = spec.n_features.unwrap_or(n_features_hint);
        if n_features == 0 {
            return Err(BuildError::Invalid(
                "onnx pipeline needs n_features or a feature schema".to_string(),
            ));
        }
        let path = base_dir.join(&spec.path);
        let model = Self::load_model(&path, n_features)
            .map_err(|e| BuildError::Unreadable(format!("{:#}", e)))?;

        Ok(Self {
            model,
            classes: spec.classes.clone(),
            n_features,
            probability_output: spec.probability_output,
            path,
        })
    }

    /// Load and optimize an ONNX graph with a fixed `[1, n_features]` input
    fn load_model(path: &Path, n_features: usize) -> Result<TractModel> {
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("Failed to parse ONNX model {}", path.display()))?
            .with_input_fact(0, f32::fact([1, n_features]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(model)
    }

    fn run(&self, input: &[f64]) -> Result<Vec<f64>> {
        let data: Vec<f32> = input.iter().map(|v| *v as f32).collect();
        let tensor: Tensor = tract_ndarray::Array2::from_shape_vec((1, self.n_features), data)
            .context("Failed to shape input tensor")?
            .into();

        let result = self.model.run(tvec!(tensor.into()))?;
        let output = result
            .get(self.probability_output)
            .with_context(|| format!("Model has no output {}", self.probability_output))?;
        let view = output.to_array_view::<f32>()?;
        Ok(view.iter().map(|v| *v as f64).collect())
    }
}

impl fmt::Debug for OnnxPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxPipeline")
            .field("path", &self.path)
            .field("classes", &self.classes)
            .field("n_features", &self.n_features)
            .finish()
    }
}

impl Pipeline for OnnxPipeline {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn predict_proba(&self, input: &[f64]) -> Result<Vec<f64>, PipelineError> {
        if self.classes.is_empty() {
            return Err(PipelineError::NotFitted);
        }
        if input.len() != self.n_features {
            return Err(PipelineError::DimensionMismatch {
                expected: self.n_features,
                actual: input.len(),
            });
        }
        self.run(input)
            .map_err(|e| PipelineError::Runtime(format!("{:#}", e)))
    }
}
