//! Synthetic bars for offline development.
//!
//! A seeded random walk from 100.0 over weekdays only. Output is tagged
//! `DataSource::Synthetic` so downstream reports can flag it.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::Rng;

use super::provider::{DataSource, FetchResult};
use crate::domain::PriceBar;
use crate::rng::{SeedHierarchy, SeedStream};

pub const START_PRICE: f64 = 100.0;

/// Generate weekday bars for `symbol` over `start..=end`.
///
/// The walk depends only on `(seed, symbol)`, so the same ticker gets the
/// same history on every run.
pub fn generate(symbol: &str, start: NaiveDate, end: NaiveDate, seed: u64) -> FetchResult {
    let mut rng = SeedHierarchy::new(seed).rng_for(symbol, SeedStream::Synthetic, 0);

    let mut bars = Vec::new();
    let mut price = START_PRICE;
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);
            bars.push(PriceBar {
                date: day,
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    FetchResult {
        symbol: symbol.to_string(),
        bars,
        fundamentals: None,
        source: DataSource::Synthetic,
    }
}
