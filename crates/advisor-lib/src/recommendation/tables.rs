//! Advice lookup tables
//!
//! The mapping from a (learner type, engagement level) pair to advice is a
//! total function: every pair has exactly one bundle and no model output is
//! consulted beyond the two labels.

use crate::models::{EngagementLevel, LearnerType, Recommendation};

/// Offered to every learner regardless of prediction
pub const RESOURCES: [&str; 4] = [
    "Interactive practice problems",
    "Video tutorials",
    "Peer study groups",
    "One-on-one tutoring sessions",
];

pub fn study_plan(learner: LearnerType) -> &'static [&'static str] {
    match learner {
        LearnerType::Advanced => &[
            "Focus on challenging problems and advanced topics",
            "Explore multiple solution approaches",
            "Consider mentoring other students",
            "Take on complex, multi-step problems",
        ],
        LearnerType::Moderate => &[
            "Practice with intermediate difficulty problems",
            "Focus on building confidence with fundamentals",
            "Gradually increase difficulty level",
            "Review concepts you find challenging",
        ],
        LearnerType::Struggling => &[
            "Start with basic concepts and fundamentals",
            "Take your time and don't rush",
            "Ask for help when needed",
            "Practice with easier problems to build confidence",
        ],
    }
}

pub fn difficulty_adjustment(learner: LearnerType) -> &'static str {
    match learner {
        LearnerType::Advanced => "Increase difficulty to maintain engagement",
        LearnerType::Moderate => "Maintain current difficulty with gradual increases",
        LearnerType::Struggling => "Decrease difficulty and provide more support",
    }
}

/// Medium engagement needs no nudging and gets no tips
pub fn motivation_tips(engagement: EngagementLevel) -> &'static [&'static str] {
    match engagement {
        EngagementLevel::Low => &[
            "Set small, achievable goals",
            "Take regular breaks",
            "Find study partners or groups",
            "Reward yourself for progress",
        ],
        EngagementLevel::Medium => &[],
        EngagementLevel::High => &[
            "Maintain your excellent momentum!",
            "Challenge yourself with advanced topics",
            "Share your knowledge with others",
            "Set ambitious but realistic goals",
        ],
    }
}

/// Advice bundle for one learner type and engagement level
pub fn recommendation_for(learner: LearnerType, engagement: EngagementLevel) -> Recommendation {
    Recommendation {
        study_plan: owned(study_plan(learner)),
        difficulty_adjustment: difficulty_adjustment(learner).to_string(),
        motivation_tips: owned(motivation_tips(engagement)),
        resources: owned(&RESOURCES),
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
