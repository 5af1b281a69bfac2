//! Simple Moving Average (SMA).
//!
//! Arithmetic mean of close prices over a trailing window.
//! Lookback: period - 1 (first defined value at index period-1).

use super::indicator::Indicator;
use crate::domain::SeriesError;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, closes: &[f64]) -> Result<Vec<Option<f64>>, SeriesError> {
        simple_moving_average(closes, self.period)
    }
}

/// Trailing mean of `closes` over `window` bars.
///
/// Each defined value is summed from its own window, so no rounding error
/// carries from one bar to the next.
pub fn simple_moving_average(closes: &[f64], window: usize) -> Result<Vec<Option<f64>>, SeriesError> {
    if closes.is_empty() {
        return Err(SeriesError::Empty);
    }
    if window == 0 {
        return Err(SeriesError::InvalidWindow { window });
    }

    let mut result = vec![None; closes.len()];
    for (offset, w) in closes.windows(window).enumerate() {
        result[offset + window - 1] = Some(w.iter().sum::<f64>() / window as f64);
    }
    Ok(result)
}
