//! Fit-quality metrics.

use serde::{Deserialize, Serialize};

/// Coefficient of determination.
///
/// Constant targets have no variance to explain: a perfect fit scores 1.0,
/// anything else 0.0. Empty input scores NaN.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    if y_true.is_empty() {
        return f64::NAN;
    }
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_tot: f64 = y_true.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(y, p)| (y - p).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    if y_true.is_empty() {
        return f64::NAN;
    }
    y_true
        .iter()
        .zip(y_pred)
        .map(|(y, p)| (y - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64
}

/// Error summary of one set of predictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
    pub samples: usize,
}

pub fn regression_metrics(y_true: &[f64], y_pred: &[f64]) -> RegressionMetrics {
    let mse = mean_squared_error(y_true, y_pred);
    RegressionMetrics {
        mse,
        rmse: mse.sqrt(),
        r2: r2_score(y_true, y_pred),
        samples: y_true.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_prediction() {
        let y = [1.0, 2.0, 3.0];
        assert_eq!(r2_score(&y, &y), 1.0);
        let m = regression_metrics(&y, &y);
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.samples, 3);
    }

    #[test]
    fn mean_prediction_scores_zero() {
        assert_eq!(r2_score(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]), 0.0);
    }

    #[test]
    fn worse_than_mean_is_negative() {
        assert!(r2_score(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) < 0.0);
    }

    #[test]
    fn hand_computed_errors() {
        // residuals 1, -1, 2 → mse = 6/3 = 2
        let m = regression_metrics(&[1.0, 2.0, 3.0], &[0.0, 3.0, 1.0]);
        assert_eq!(m.mse, 2.0);
        assert!((m.rmse - 2.0_f64.sqrt()).abs() < 1e-15);
        // ss_tot = 2, ss_res = 6 → r2 = -2
        assert_eq!(m.r2, -2.0);
    }

    #[test]
    fn constant_targets() {
        assert_eq!(r2_score(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(r2_score(&[5.0, 5.0], &[5.0, 4.0]), 0.0);
    }

    #[test]
    fn empty_is_nan() {
        assert!(r2_score(&[], &[]).is_nan());
        assert!(mean_squared_error(&[], &[]).is_nan());
    }
}
