//! PriceSeries — validated, date-ordered bars for one ticker.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use super::bar::PriceBar;

/// Malformed input: the series cannot be analysed at all.
///
/// Distinct from "insufficient history", which is an expected outcome and
/// never produced here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("price series is empty")]
    Empty,

    #[error("invalid {field} price {value} on {date}")]
    InvalidPrice {
        date: NaiveDate,
        field: &'static str,
        value: f64,
    },

    #[error("dates not strictly increasing at bar {index}: {previous} then {current}")]
    UnorderedDates {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("window must be >= 1 (got {window})")]
    InvalidWindow { window: usize },
}

/// Ordered OHLCV history for one symbol.
///
/// Invariants (checked by `new`): at least one bar, dates strictly
/// increasing, every price positive and finite.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        if bars.is_empty() {
            return Err(SeriesError::Empty);
        }
        for bar in &bars {
            bar.validate()?;
        }
        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::UnorderedDates {
                    index: i + 1,
                    previous: pair[0].date,
                    current: pair[1].date,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false; a series cannot be constructed empty.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Closing-price sub-series, the predictor's only input.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    pub fn last_close(&self) -> f64 {
        self.bars[self.bars.len() - 1].close
    }

    /// Number of bars whose high/low envelope does not contain open and close.
    pub fn inconsistent_bar_count(&self) -> usize {
        self.bars.iter().filter(|b| !b.is_consistent()).count()
    }
}

/// Build a series from close prices on consecutive calendar days, for tests.
///
/// open = previous close, high/low = max/min(open, close) +/- 1.
#[cfg(test)]
pub fn series_from_closes(symbol: &str, closes: &[f64]) -> PriceSeries {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: (open.min(close) - 1.0).max(0.01),
                close,
                volume: 1_000,
            }
        })
        .collect();
    PriceSeries::new(symbol, bars).unwrap()
}
