//! Indicator trait and the aligned indicator-series container.
//!
//! Indicators are pure functions: closing prices in, one value per bar out.
//! The first `lookback()` entries are `None` (insufficient history), which is
//! an expected outcome and distinct from a `SeriesError`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::SeriesError;

/// Trait for close-price indicators.
///
/// # Look-ahead guard
/// No value at bar t may depend on closes after bar t. Computing on a
/// truncated series must reproduce the prefix of the full-series output.
pub trait Indicator: Send + Sync {
    /// Column name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading bars without a defined value.
    fn lookback(&self) -> usize;

    /// Compute one value per close. Fails only on empty input or a zero window.
    fn compute(&self, closes: &[f64]) -> Result<Vec<Option<f64>>, SeriesError>;
}

/// One named indicator column aligned to the source bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl IndicatorColumn {
    pub fn compute(indicator: &dyn Indicator, closes: &[f64]) -> Result<Self, SeriesError> {
        Ok(Self {
            name: indicator.name().to_string(),
            values: indicator.compute(closes)?,
        })
    }

    /// Number of bars with a defined value.
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Most recent defined value.
    pub fn latest(&self) -> Option<f64> {
        self.values.iter().rev().find_map(|v| *v)
    }

    pub fn get(&self, bar_index: usize) -> Option<f64> {
        self.values.get(bar_index).copied().flatten()
    }
}

/// Indicator columns for one series, date-aligned with its bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub dates: Vec<NaiveDate>,
    pub sma_short: IndicatorColumn,
    pub sma_long: IndicatorColumn,
    pub rsi: IndicatorColumn,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn columns(&self) -> [&IndicatorColumn; 3] {
        [&self.sma_short, &self.sma_long, &self.rsi]
    }

    /// Look up a column by its name.
    pub fn column(&self, name: &str) -> Option<&IndicatorColumn> {
        self.columns().into_iter().find(|c| c.name == name)
    }

    /// Value of a named column at a bar index (`None` if absent or unknown).
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.column(name).and_then(|c| c.get(bar_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, values: Vec<Option<f64>>) -> IndicatorColumn {
        IndicatorColumn {
            name: name.into(),
            values,
        }
    }

    #[test]
    fn column_latest_skips_trailing_absence() {
        let c = column("x", vec![None, Some(1.0), Some(2.0), None]);
        assert_eq!(c.latest(), Some(2.0));
        assert_eq!(c.defined_count(), 2);
        assert_eq!(c.get(0), None);
        assert_eq!(c.get(2), Some(2.0));
        assert_eq!(c.get(99), None);
    }

    #[test]
    fn series_lookup_by_name() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let s = IndicatorSeries {
            dates: vec![d, d.succ_opt().unwrap()],
            sma_short: column("sma_20", vec![None, Some(5.0)]),
            sma_long: column("sma_50", vec![None, None]),
            rsi: column("rsi_14", vec![None, Some(60.0)]),
        };
        assert_eq!(s.len(), 2);
        assert_eq!(s.get("sma_20", 1), Some(5.0));
        assert_eq!(s.get("rsi_14", 1), Some(60.0));
        assert_eq!(s.get("nonexistent", 1), None);
        assert!(s.column("sma_50").is_some());
    }
}
