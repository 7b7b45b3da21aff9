//! Decision-tree ensembles: random forests and gradient boosting.
//!
//! Trees are stored as flat node arrays in preorder, the layout tree
//! learners export: node 0 is the root and children always come after
//! their parent, so evaluation always terminates.

use super::{score_count, scores_to_proba, BuildError, Pipeline};
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// One serialized tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    /// Go to `left` when `input[feature] <= threshold`, else `right`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class weights (forests) or a single additive value (boosting)
    Leaf { value: Vec<f64> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSpec {
    pub nodes: Vec<NodeSpec>,
}

/// Validated tree
#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<NodeSpec>,
}

impl Tree {
    fn new(spec: &TreeSpec, leaf_width: usize) -> Result<Self, BuildError> {
        if spec.nodes.is_empty() {
            return Err(BuildError::Invalid("tree has no nodes".to_string()));
        }
        for (idx, node) in spec.nodes.iter().enumerate() {
            match node {
                NodeSpec::Split { left, right, .. } => {
                    for child in [*left, *right] {
                        if child <= idx || child >= spec.nodes.len() {
                            return Err(BuildError::Invalid(format!(
                                "node {} links to invalid child {}",
                                idx, child
                            )));
                        }
                    }
                }
                NodeSpec::Leaf { value } => {
                    if value.len() != leaf_width {
                        return Err(BuildError::Invalid(format!(
                            "leaf {} has {} values, expected {}",
                            idx,
                            value.len(),
                            leaf_width
                        )));
                    }
                }
            }
        }
        Ok(Self {
            nodes: spec.nodes.clone(),
        })
    }

    /// Smallest input width this tree can be evaluated on
    fn required_features(&self) -> usize {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                NodeSpec::Split { feature, .. } => Some(feature + 1),
                NodeSpec::Leaf { .. } => None,
            })
            .max()
            .unwrap_or(0)
    }

    fn leaf(&self, input: &[f64]) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                NodeSpec::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if input[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                NodeSpec::Leaf { value } => return value,
            }
        }
    }
}

fn required_features<'a>(trees: impl Iterator<Item = &'a Tree>) -> usize {
    trees.map(Tree::required_features).max().unwrap_or(0)
}

fn check_width(required: usize, input: &[f64]) -> Result<(), PipelineError> {
    if input.len() < required {
        return Err(PipelineError::DimensionMismatch {
            expected: required,
            actual: input.len(),
        });
    }
    Ok(())
}

/// Serialized random forest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForestSpec {
    #[serde(default, deserialize_with = "super::deserialize_labels")]
    pub classes: Vec<String>,
    #[serde(default)]
    pub trees: Vec<TreeSpec>,
}

/// Averages the normalized leaf distributions of every tree
#[derive(Debug, Clone)]
pub struct RandomForest {
    classes: Vec<String>,
    trees: Vec<Tree>,
    required_features: usize,
}

impl RandomForest {
    pub fn new(spec: &ForestSpec) -> Result<Self, BuildError> {
        let trees = spec
            .trees
            .iter()
            .map(|t| Tree::new(t, spec.classes.len()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            classes: spec.classes.clone(),
            required_features: required_features(trees.iter()),
            trees,
        })
    }
}

impl Pipeline for RandomForest {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict_proba(&self, input: &[f64]) -> Result<Vec<f64>, PipelineError> {
        if self.classes.is_empty() || self.trees.is_empty() {
            return Err(PipelineError::NotFitted);
        }
        check_width(self.required_features, input)?;

        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf(input);
            let total: f64 = leaf.iter().sum();
            if total <= 0.0 {
                return Err(PipelineError::Runtime("tree reached an empty leaf".to_string()));
            }
            for (p, v) in proba.iter_mut().zip(leaf) {
                *p += v / total;
            }
        }
        let n = self.trees.len() as f64;
        Ok(proba.into_iter().map(|p| p / n).collect())
    }
}

/// Serialized gradient-boosted ensemble: each stage holds one regression
/// tree per decision score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostingSpec {
    #[serde(default, deserialize_with = "super::deserialize_labels")]
    pub classes: Vec<String>,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default)]
    pub init: Vec<f64>,
    #[serde(default)]
    pub stages: Vec<Vec<TreeSpec>>,
}

fn default_learning_rate() -> f64 {
    0.1
}

#[derive(Debug, Clone)]
pub struct GradientBoosting {
    classes: Vec<String>,
    learning_rate: f64,
    init: Vec<f64>,
    stages: Vec<Vec<Tree>>,
    required_features: usize,
}

impl GradientBoosting {
    pub fn new(spec: &BoostingSpec) -> Result<Self, BuildError> {
        let mut stages = Vec::with_capacity(spec.stages.len());
        if !spec.classes.is_empty() {
            if spec.classes.len() < 2 {
                return Err(BuildError::Invalid(
                    "gradient boosting needs at least two classes".to_string(),
                ));
            }
            let scores = score_count(spec.classes.len());
            if spec.init.len() != scores {
                return Err(BuildError::Invalid(format!(
                    "{} classes need {} initial scores, found {}",
                    spec.classes.len(),
                    scores,
                    spec.init.len()
                )));
            }
            for (idx, stage) in spec.stages.iter().enumerate() {
                if stage.len() != scores {
                    return Err(BuildError::Invalid(format!(
                        "stage {} has {} trees, expected {}",
                        idx,
                        stage.len(),
                        scores
                    )));
                }
                stages.push(
                    stage
                        .iter()
                        .map(|t| Tree::new(t, 1))
                        .collect::<Result<Vec<_>, _>>()?,
                );
            }
        }

        Ok(Self {
            classes: spec.classes.clone(),
            learning_rate: spec.learning_rate,
            init: spec.init.clone(),
            required_features: required_features(stages.iter().flatten()),
            stages,
        })
    }
}

impl Pipeline for GradientBoosting {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict_proba(&self, input: &[f64]) -> Result<Vec<f64>, PipelineError> {
        if self.classes.is_empty() {
            return Err(PipelineError::NotFitted);
        }
        check_width(self.required_features, input)?;

        let mut scores = self.init.clone();
        for stage in &self.stages {
            for (score, tree) in scores.iter_mut().zip(stage) {
                *score += self.learning_rate * tree.leaf(input)[0];
            }
        }
        Ok(scores_to_proba(&scores))
    }
}
