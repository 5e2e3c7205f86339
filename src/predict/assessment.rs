//! Fixed threshold tables turning a score (or a raw signal) into labels.

use serde::{Deserialize, Serialize};

/// Signal read for growth potential.
pub const GROWTH_SIGNAL: &str = "learning_behavior";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    Expert,
    Advanced,
    Intermediate,
}

impl SkillLevel {
    pub fn from_score(score: f64) -> Self {
        if score > 80.0 {
            SkillLevel::Expert
        } else if score > 60.0 {
            SkillLevel::Advanced
        } else {
            SkillLevel::Intermediate
        }
    }
}

/// Three-step grade shared by capacity, growth and risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    High,
    Moderate,
    Low,
}

impl Grade {
    pub fn work_capacity(score: f64) -> Self {
        if score > 75.0 {
            Grade::High
        } else if score > 45.0 {
            Grade::Moderate
        } else {
            Grade::Low
        }
    }

    pub fn growth_potential(learning_behavior: f64) -> Self {
        if learning_behavior > 60.0 {
            Grade::High
        } else if learning_behavior > 30.0 {
            Grade::Moderate
        } else {
            Grade::Low
        }
    }

    /// Higher scores mean lower risk.
    pub fn risk(score: f64) -> Self {
        if score > 70.0 {
            Grade::Low
        } else if score > 40.0 {
            Grade::Moderate
        } else {
            Grade::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 50.0 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkforceAssessment {
    pub work_capacity: Grade,
    pub growth_potential: Grade,
    pub risk_level: Grade,
}

impl WorkforceAssessment {
    pub fn new(score: f64, learning_behavior: f64) -> Self {
        Self {
            work_capacity: Grade::work_capacity(score),
            growth_potential: Grade::growth_potential(learning_behavior),
            risk_level: Grade::risk(score),
        }
    }
}
