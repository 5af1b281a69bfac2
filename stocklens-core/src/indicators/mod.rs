//! Indicator engine.
//!
//! Stateless, deterministic transforms from a `PriceSeries` to an
//! `IndicatorSeries`: a short and a long simple moving average plus RSI.
//! Everything here is a pure function of the closes; two runs on the same
//! input are bit-identical.

pub mod indicator;
pub mod rsi;
pub mod sma;

pub use indicator::{Indicator, IndicatorColumn, IndicatorSeries};
pub use rsi::{relative_strength_index, Rsi, RsiZone, ZERO_LOSS_RSI};
pub use sma::{simple_moving_average, Sma};

use serde::{Deserialize, Serialize};

use crate::domain::{PriceSeries, SeriesError};

pub const DEFAULT_SMA_SHORT: usize = 20;
pub const DEFAULT_SMA_LONG: usize = 50;
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// The indicator columns computed for every analysis.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub sma_short: Sma,
    pub sma_long: Sma,
    pub rsi: Rsi,
}

impl IndicatorSet {
    pub fn new(sma_short: usize, sma_long: usize, rsi_period: usize) -> Self {
        Self {
            sma_short: Sma::new(sma_short),
            sma_long: Sma::new(sma_long),
            rsi: Rsi::new(rsi_period),
        }
    }

    /// Longest warmup among the columns.
    pub fn max_lookback(&self) -> usize {
        self.sma_short
            .lookback()
            .max(self.sma_long.lookback())
            .max(self.rsi.lookback())
    }

    pub fn compute(&self, series: &PriceSeries) -> Result<IndicatorSeries, SeriesError> {
        let closes = series.closes();
        Ok(IndicatorSeries {
            dates: series.dates(),
            sma_short: IndicatorColumn::compute(&self.sma_short, &closes)?,
            sma_long: IndicatorColumn::compute(&self.sma_long, &closes)?,
            rsi: IndicatorColumn::compute(&self.rsi, &closes)?,
        })
    }
}

impl Default for IndicatorSet {
    fn default() -> Self {
        Self::new(DEFAULT_SMA_SHORT, DEFAULT_SMA_LONG, DEFAULT_RSI_PERIOD)
    }
}

/// Most recent defined value of each column.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatestValues {
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub rsi: Option<f64>,
}

impl IndicatorSeries {
    pub fn latest(&self) -> LatestValues {
        LatestValues {
            sma_short: self.sma_short.latest(),
            sma_long: self.sma_long.latest(),
            rsi: self.rsi.latest(),
        }
    }

    /// Zone of the most recent defined RSI value.
    pub fn rsi_zone(&self) -> Option<RsiZone> {
        self.rsi.latest().map(RsiZone::classify)
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
