//! Core data models for the learning advisor

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The fixed set of models the advisor knows how to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    LearnerClassification,
    PerformancePrediction,
    EngagementAnalysis,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::LearnerClassification,
        ModelKind::PerformancePrediction,
        ModelKind::EngagementAnalysis,
    ];

    /// Logical name used as the registry key
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::LearnerClassification => "learner-classification",
            ModelKind::PerformancePrediction => "performance-prediction",
            ModelKind::EngagementAnalysis => "engagement-analysis",
        }
    }

    /// File name the training job writes for this model
    pub fn artifact_file(self) -> &'static str {
        match self {
            ModelKind::LearnerClassification => "learner_classification_rf.json",
            ModelKind::PerformancePrediction => "performance_prediction_gb.json",
            ModelKind::EngagementAnalysis => "engagement_analysis_rf.json",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown model `{}`", s))
    }
}

/// Session metrics supplied by the caller, keyed by feature name.
///
/// Values are loosely typed: numbers, booleans and numeric strings are
/// accepted when a feature vector is built; anything else is rejected there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentFeatures(BTreeMap<String, Value>);

impl StudentFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for StudentFeatures {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Top class of one model run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Probability of `label`, the maximum of the model's distribution
    pub confidence: f64,
}

/// Proficiency classes produced by the learner-classification model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearnerType {
    Advanced,
    Moderate,
    Struggling,
}

impl LearnerType {
    pub const ALL: [LearnerType; 3] = [
        LearnerType::Advanced,
        LearnerType::Moderate,
        LearnerType::Struggling,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LearnerType::Advanced => "advanced",
            LearnerType::Moderate => "moderate",
            LearnerType::Struggling => "struggling",
        }
    }
}

impl FromStr for LearnerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LearnerType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("unknown learner type `{}`", s))
    }
}

impl fmt::Display for LearnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behavioral engagement classes produced by the engagement-analysis model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementLevel {
    Low,
    Medium,
    High,
}

impl EngagementLevel {
    pub const ALL: [EngagementLevel; 3] = [
        EngagementLevel::Low,
        EngagementLevel::Medium,
        EngagementLevel::High,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EngagementLevel::Low => "low",
            EngagementLevel::Medium => "medium",
            EngagementLevel::High => "high",
        }
    }
}

impl FromStr for EngagementLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EngagementLevel::ALL
            .into_iter()
            .find(|l| l.as_str() == s.trim())
            .ok_or_else(|| format!("unknown engagement level `{}`", s))
    }
}

impl fmt::Display for EngagementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advice bundle returned to the learner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub study_plan: Vec<String>,
    pub difficulty_adjustment: String,
    pub motivation_tips: Vec<String>,
    pub resources: Vec<String>,
}

/// Recommendation together with the predictions it was derived from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveReport {
    pub learner_type: LearnerType,
    pub engagement_level: EngagementLevel,
    pub learner: Prediction,
    pub engagement: Prediction,
    pub recommendation: Recommendation,
}

/// Chance of answering the next question correctly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuccessEstimate {
    pub success_probability: f64,
    pub predicted_success: bool,
}
