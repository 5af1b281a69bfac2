//! Lookback windows offered to the caller.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// History window requested from the market-data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lookback {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown lookback '{0}' (expected one of 1mo, 3mo, 6mo, 1y, 2y, 5y)")]
pub struct UnknownLookback(pub String);

impl Lookback {
    pub const ALL: [Lookback; 6] = [
        Lookback::OneMonth,
        Lookback::ThreeMonths,
        Lookback::SixMonths,
        Lookback::OneYear,
        Lookback::TwoYears,
        Lookback::FiveYears,
    ];

    pub fn months(self) -> u32 {
        match self {
            Lookback::OneMonth => 1,
            Lookback::ThreeMonths => 3,
            Lookback::SixMonths => 6,
            Lookback::OneYear => 12,
            Lookback::TwoYears => 24,
            Lookback::FiveYears => 60,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lookback::OneMonth => "1mo",
            Lookback::ThreeMonths => "3mo",
            Lookback::SixMonths => "6mo",
            Lookback::OneYear => "1y",
            Lookback::TwoYears => "2y",
            Lookback::FiveYears => "5y",
        }
    }

    /// First calendar date covered when the window ends on `end`.
    pub fn start_from(self, end: NaiveDate) -> NaiveDate {
        end.checked_sub_months(Months::new(self.months()))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl Default for Lookback {
    fn default() -> Self {
        Lookback::OneYear
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lookback {
    type Err = UnknownLookback;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Lookback::ALL
            .into_iter()
            .find(|l| l.as_str() == needle)
            .ok_or_else(|| UnknownLookback(s.to_string()))
    }
}
