//! Domain types: bars, validated series, lookback windows, fundamentals.

pub mod bar;
pub mod fundamentals;
pub mod lookback;
pub mod series;

pub use bar::PriceBar;
pub use fundamentals::{format_large_number, Fundamentals, KeyMetrics};
pub use lookback::{Lookback, UnknownLookback};
pub use series::{PriceSeries, SeriesError};
