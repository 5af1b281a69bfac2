//! Data provider trait and structured error types.
//!
//! `DataProvider` abstracts over market-data sources so the loader can fall
//! back between them and tests can substitute a fake.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Fundamentals, PriceBar};

/// Why a provider could not deliver bars.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("provider blocked: circuit breaker open for another {remaining_secs}s")]
    CircuitBreakerTripped { remaining_secs: u64 },

    #[error("CSV import failed: {0}")]
    Csv(String),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Worth retrying the same request later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DataError::NetworkUnreachable(_) | DataError::RateLimited { .. }
        )
    }
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
}

impl DataSource {
    pub fn is_synthetic(self) -> bool {
        self == DataSource::Synthetic
    }
}

/// Result of a successful fetch for a single symbol.
///
/// Bars are in date order but not yet validated into a `PriceSeries`.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
    pub fundamentals: Option<Fundamentals>,
    pub source: DataSource,
}

pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for `symbol` over `start..=end`.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError>;

    /// Whether the provider is currently accepting requests.
    fn is_available(&self) -> bool;
}
