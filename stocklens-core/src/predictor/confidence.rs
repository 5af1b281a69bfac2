//! Confidence grading of a fitted model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Held-out R² above which a forecast is graded High.
pub const HIGH_THRESHOLD: f64 = 0.7;
/// Held-out R² above which a forecast is graded Medium.
pub const MEDIUM_THRESHOLD: f64 = 0.5;

/// Qualitative grade. Boundaries are strict: a score of exactly 0.7 is
/// Medium, exactly 0.5 is Low. NaN is Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn from_test_score(test_score: f64) -> Self {
        if test_score > HIGH_THRESHOLD {
            ConfidenceTier::High
        } else if test_score > MEDIUM_THRESHOLD {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceTier::High => "High",
            ConfidenceTier::Medium => "Medium",
            ConfidenceTier::Low => "Low",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub train_score: f64,
    pub test_score: f64,
    pub tier: ConfidenceTier,
}

impl Confidence {
    pub fn from_scores(train_score: f64, test_score: f64) -> Self {
        Self {
            train_score,
            test_score,
            tier: ConfidenceTier::from_test_score(test_score),
        }
    }
}
