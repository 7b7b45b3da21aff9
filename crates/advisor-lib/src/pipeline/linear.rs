//! Logistic regression classifier

use super::{score_count, scores_to_proba, BuildError, Pipeline};
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// Serialized logistic regression: one coefficient row per decision score
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearSpec {
    #[serde(default, deserialize_with = "super::deserialize_labels")]
    pub classes: Vec<String>,
    #[serde(default)]
    pub coef: Vec<Vec<f64>>,
    #[serde(default)]
    pub intercept: Vec<f64>,
}

/// Binary models carry a single row scoring the second class;
/// multi-class models carry one row per class and use softmax.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    classes: Vec<String>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
}

impl LogisticRegression {
    pub fn new(spec: &LinearSpec) -> Result<Self, BuildError> {
        if !spec.classes.is_empty() {
            if spec.classes.len() < 2 {
                return Err(BuildError::Invalid(
                    "logistic regression needs at least two classes".to_string(),
                ));
            }
            let rows = score_count(spec.classes.len());
            if spec.coef.len() != rows || spec.intercept.len() != rows {
                return Err(BuildError::Invalid(format!(
                    "{} classes need {} coefficient rows and intercepts, found {} and {}",
                    spec.classes.len(),
                    rows,
                    spec.coef.len(),
                    spec.intercept.len()
                )));
            }
            let width = spec.coef[0].len();
            if spec.coef.iter().any(|row| row.len() != width) {
                return Err(BuildError::Invalid(
                    "coefficient rows have different widths".to_string(),
                ));
            }
        }

        Ok(Self {
            classes: spec.classes.clone(),
            coef: spec.coef.clone(),
            intercept: spec.intercept.clone(),
        })
    }
}

impl Pipeline for LogisticRegression {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> Option<usize> {
        self.coef.first().map(Vec::len)
    }

    fn predict_proba(&self, input: &[f64]) -> Result<Vec<f64>, PipelineError> {
        if self.classes.is_empty() {
            return Err(PipelineError::NotFitted);
        }
        let width = self.coef[0].len();
        if input.len() != width {
            return Err(PipelineError::DimensionMismatch {
                expected: width,
                actual: input.len(),
            });
        }

        let scores: Vec<f64> = self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();
        Ok(scores_to_proba(&scores))
    }
}
