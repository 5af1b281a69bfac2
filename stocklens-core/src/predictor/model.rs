//! Regressor seam.
//!
//! A `Regressor` is an unfitted estimator configuration; fitting produces an
//! owned `Predict` model. The pipeline is generic over this pair so the model
//! family can change without touching windowing, scaling or forecasting.

use std::time::Duration;
use thiserror::Error;

use super::metrics::r2_score;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("no training examples")]
    NoExamples,

    #[error("feature rows have inconsistent width: expected {expected}, found {found} at row {row}")]
    RaggedFeatures {
        expected: usize,
        found: usize,
        row: usize,
    },

    #[error("{features} feature rows but {targets} targets")]
    LengthMismatch { features: usize, targets: usize },

    #[error("non-finite value in training data at row {row}")]
    NonFinite { row: usize },

    #[error("cannot split {examples} examples with test fraction {test_fraction}")]
    EmptyPartition { examples: usize, test_fraction: f64 },

    #[error("training budget of {budget:?} exceeded after {fitted} of {requested} trees")]
    BudgetExceeded {
        budget: Duration,
        fitted: usize,
        requested: usize,
    },

    #[error("model fit failed: {0}")]
    Fit(String),
}

/// Unfitted estimator.
pub trait Regressor: Send + Sync {
    type Model: Predict;

    /// Fit on `features` (one row per example) and `targets`.
    ///
    /// `seed` drives every random choice of the fit; equal seeds on equal
    /// data must give equal models.
    fn fit(&self, features: &[Vec<f64>], targets: &[f64], seed: u64) -> Result<Self::Model, TrainingError>;
}

/// Fitted model.
pub trait Predict: Send + Sync {
    fn predict(&self, row: &[f64]) -> f64;

    fn predict_many(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|r| self.predict(r)).collect()
    }

    /// R² of the model's predictions on `rows` against `targets`.
    fn score(&self, rows: &[Vec<f64>], targets: &[f64]) -> f64 {
        r2_score(targets, &self.predict_many(rows))
    }
}

/// Shape and finiteness checks shared by regressors.
pub fn check_training_data(features: &[Vec<f64>], targets: &[f64]) -> Result<usize, TrainingError> {
    if features.is_empty() {
        return Err(TrainingError::NoExamples);
    }
    if features.len() != targets.len() {
        return Err(TrainingError::LengthMismatch {
            features: features.len(),
            targets: targets.len(),
        });
    }
    let width = features[0].len();
    for (row, (x, y)) in features.iter().zip(targets).enumerate() {
        if x.len() != width {
            return Err(TrainingError::RaggedFeatures {
                expected: width,
                found: x.len(),
                row,
            });
        }
        if !y.is_finite() || x.iter().any(|v| !v.is_finite()) {
            return Err(TrainingError::NonFinite { row });
        }
    }
    Ok(width)
}
