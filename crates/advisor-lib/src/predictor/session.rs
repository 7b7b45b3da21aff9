//! Session feature derivation
//!
//! Turns the raw outcome of each quiz question, plus the accuracy of every
//! session taken so far, into the feature map the models are fed. The same
//! quantities are also published under the names the engagement model was
//! trained with.

use crate::models::StudentFeatures;
use serde::{Deserialize, Serialize};

/// Minimum number of answered questions needed to derive features
pub const MIN_OUTCOMES: usize = 1;

/// Number of sessions compared at each end of the history for the trend
const TREND_WINDOW: usize = 3;

/// What happened on one question
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub correct: bool,
    pub time_seconds: f64,
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default)]
    pub hints_used: u32,
}

fn default_attempts() -> u32 {
    1
}

/// Derives model features from quiz telemetry
#[derive(Debug, Clone)]
pub struct SessionFeatureExtractor {
    trend_window: usize,
}

impl Default for SessionFeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionFeatureExtractor {
    pub fn new() -> Self {
        Self {
            trend_window: TREND_WINDOW,
        }
    }

    pub fn has_sufficient_data(&self, outcomes: &[QuestionOutcome]) -> bool {
        outcomes.len() >= MIN_OUTCOMES
    }

    /// Features for the current session.
    ///
    /// `history` holds the accuracy of every session so far, oldest first,
    /// including the current one. Returns `None` when nothing was answered.
    pub fn extract(
        &self,
        outcomes: &[QuestionOutcome],
        history: &[f64],
    ) -> Option<StudentFeatures> {
        if !self.has_sufficient_data(outcomes) {
            return None;
        }

        let n = outcomes.len() as f64;
        let correctness: Vec<f64> = outcomes
            .iter()
            .map(|o| if o.correct { 1.0 } else { 0.0 })
            .collect();
        let accuracy = correctness.iter().sum::<f64>() / n;
        let avg_time = outcomes.iter().map(|o| o.time_seconds).sum::<f64>() / n;
        let avg_attempts = outcomes.iter().map(|o| o.attempts as f64).sum::<f64>() / n;
        let avg_hints = outcomes.iter().map(|o| o.hints_used as f64).sum::<f64>() / n;

        let consistency = if outcomes.len() > 1 {
            1.0 - std_dev(&correctness)
        } else {
            1.0
        };
        let speed_accuracy_tradeoff = if avg_time > 0.0 {
            accuracy / (avg_time / 60.0)
        } else {
            0.0
        };
        let persistence = if accuracy > 0.0 {
            avg_attempts / accuracy
        } else {
            1.0
        };
        let efficiency = if avg_attempts > 0.0 {
            accuracy / avg_attempts
        } else {
            accuracy
        };
        let engagement =
            (accuracy * 40.0 + efficiency_points(avg_attempts) + speed_points(avg_time)) / 100.0;

        let features = StudentFeatures::new()
            .with("accuracy", accuracy)
            .with("total_questions", outcomes.len() as u64)
            .with("avg_time_seconds", avg_time)
            .with("avg_attempts", avg_attempts)
            .with("avg_hints_used", avg_hints)
            .with("consistency", consistency)
            .with("speed_accuracy_tradeoff", speed_accuracy_tradeoff)
            .with("persistence", persistence)
            .with("engagement", engagement)
            .with("efficiency", efficiency)
            .with("learning_progress", self.learning_progress(history))
            .with("consistency_over_time", consistency_over_time(history))
            .with("improvement_trend", self.improvement_trend(history))
            .with("total_attempts", history.len() as u64)
            // Names used by the engagement model
            .with("total_interactions", outcomes.len() as u64)
            .with("avg_accuracy", accuracy)
            .with("accuracy_std", 1.0 - consistency)
            .with("avg_time", avg_time);

        Some(features)
    }

    fn learning_progress(&self, history: &[f64]) -> f64 {
        match (history.first(), history.last()) {
            (Some(first), Some(last)) if history.len() > 1 => last - first,
            _ => 0.0,
        }
    }

    fn improvement_trend(&self, history: &[f64]) -> f64 {
        if history.len() < self.trend_window {
            return 0.0;
        }
        let recent = &history[history.len() - self.trend_window..];
        let earlier = &history[..self.trend_window];
        mean(recent) - mean(earlier)
    }
}

fn consistency_over_time(history: &[f64]) -> f64 {
    if history.len() > 1 {
        1.0 - std_dev(history)
    } else {
        1.0
    }
}

/// 30 points for first-try answers, fewer as retries pile up
fn efficiency_points(avg_attempts: f64) -> f64 {
    match avg_attempts {
        a if a <= 1.0 => 30.0,
        a if a <= 2.0 => 20.0,
        a if a <= 3.0 => 10.0,
        _ => 0.0,
    }
}

/// 30 points for answering within 30 seconds, fewer for slower answers
fn speed_points(avg_time: f64) -> f64 {
    match avg_time {
        t if t <= 30.0 => 30.0,
        t if t <= 60.0 => 20.0,
        t if t <= 90.0 => 10.0,
        _ => 0.0,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
