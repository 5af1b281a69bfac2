//! PriceBar — one trading-period observation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::series::SeriesError;

/// Daily OHLCV observation for a single symbol.
///
/// Immutable once fetched: the series and every stage downstream only read it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Check that every price field is positive and finite.
    pub fn validate(&self) -> Result<(), SeriesError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(SeriesError::InvalidPrice {
                    date: self.date,
                    field,
                    value,
                });
            }
        }
        Ok(())
    }

    /// High/low envelope check: high >= max(open, close), low <= min(open, close).
    ///
    /// Providers occasionally report bars that violate this by a rounding
    /// error, so it is advisory and not part of `validate`.
    pub fn is_consistent(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            volume: 50_000,
        }
    }

    #[test]
    fn valid_bar_passes() {
        assert!(sample_bar().validate().is_ok());
        assert!(sample_bar().is_consistent());
    }

    #[test]
    fn nan_close_rejected() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        match bar.validate() {
            Err(SeriesError::InvalidPrice { field, .. }) => assert_eq!(field, "close"),
            other => panic!("expected InvalidPrice, got {other:?}"),
        }
    }

    #[test]
    fn non_positive_open_rejected() {
        let mut bar = sample_bar();
        bar.open = 0.0;
        assert!(bar.validate().is_err());
    }

    #[test]
    fn inverted_high_low_is_inconsistent_but_valid() {
        let mut bar = sample_bar();
        bar.high = 97.0;
        assert!(bar.validate().is_ok());
        assert!(!bar.is_consistent());
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: PriceBar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
