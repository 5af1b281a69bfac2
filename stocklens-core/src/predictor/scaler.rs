//! Min-max scaling into [0, 1].

use serde::{Deserialize, Serialize};

/// Linear map fitted on one series: `(x - min) / (max - min)`.
///
/// A constant series has zero range; the scale then falls back to 1 so every
/// observed value maps to 0 and inversion returns `min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Fit on `values`. `None` when empty or any value is not finite.
    pub fn fit(values: &[f64]) -> Option<Self> {
        if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Some(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    fn range(&self) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 {
            1.0
        } else {
            range
        }
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.min) / self.range()
    }

    pub fn inverse_transform(&self, scaled: f64) -> f64 {
        scaled * self.range() + self.min
    }

    pub fn transform_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform(v)).collect()
    }

    pub fn inverse_all(&self, scaled: &[f64]) -> Vec<f64> {
        scaled.iter().map(|&v| self.inverse_transform(v)).collect()
    }
}
