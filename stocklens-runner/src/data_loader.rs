//! Series loading for the runner.
//!
//! Fallback policy, first match wins:
//! 1. A CSV file was given → import it
//! 2. A provider is available → fetch the lookback window
//! 3. Synthetic fallback enabled → generate a seeded walk (tagged)
//! 4. Otherwise → fail with the last reason
//!
//! Synthetic data is a developer mode. Reports built on it carry
//! `DataSource::Synthetic`.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use stocklens_core::data::provider::{DataError, DataProvider, DataSource, FetchResult};
use stocklens_core::data::{csv_import, synthetic};
use stocklens_core::domain::{Fundamentals, Lookback, PriceSeries, SeriesError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data for '{symbol}': {reason} (use --synthetic for synthetic data)")]
    Unavailable { symbol: String, reason: String },

    #[error("invalid series for '{symbol}': {source}")]
    Series {
        symbol: String,
        #[source]
        source: SeriesError,
    },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub lookback: Lookback,
    /// Last date of the window.
    pub end: NaiveDate,
    /// Import this file instead of contacting the provider. Used whole;
    /// the lookback does not trim it.
    pub csv_path: Option<PathBuf>,
    pub synthetic_fallback: bool,
    /// Seed of the synthetic walk.
    pub seed: u64,
}

impl LoadOptions {
    pub fn new(lookback: Lookback, end: NaiveDate) -> Self {
        Self {
            lookback,
            end,
            csv_path: None,
            synthetic_fallback: false,
            seed: 42,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.lookback.start_from(self.end)
    }
}

/// A validated series plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub series: PriceSeries,
    pub fundamentals: Option<Fundamentals>,
    pub source: DataSource,
}

impl LoadedData {
    pub fn is_synthetic(&self) -> bool {
        self.source.is_synthetic()
    }
}

pub fn load_series(
    symbol: &str,
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
) -> Result<LoadedData, LoadError> {
    if let Some(path) = &opts.csv_path {
        let fetched = csv_import::load_csv(symbol, path)?;
        return into_loaded(fetched);
    }

    let mut reason = String::from("no data provider configured");
    if let Some(provider) = provider {
        if provider.is_available() {
            match provider.fetch(symbol, opts.start(), opts.end) {
                Ok(fetched) => {
                    info!(symbol, provider = provider.name(), bars = fetched.bars.len(), "fetched bars");
                    return into_loaded(fetched);
                }
                Err(e) => {
                    warn!(symbol, provider = provider.name(), error = %e, "fetch failed");
                    reason = e.to_string();
                }
            }
        } else {
            reason = format!("provider '{}' is not accepting requests", provider.name());
        }
    }

    if opts.synthetic_fallback {
        warn!(symbol, "generating synthetic data; results will be tagged as synthetic");
        let fetched = synthetic::generate(symbol, opts.start(), opts.end, opts.seed);
        return into_loaded(fetched);
    }

    Err(LoadError::Unavailable {
        symbol: symbol.to_string(),
        reason,
    })
}

fn into_loaded(fetched: FetchResult) -> Result<LoadedData, LoadError> {
    let FetchResult {
        symbol,
        bars,
        fundamentals,
        source,
    } = fetched;
    let series = PriceSeries::new(symbol.clone(), bars).map_err(|source| LoadError::Series { symbol, source })?;
    if series.inconsistent_bar_count() > 0 {
        warn!(
            symbol = series.symbol(),
            bars = series.inconsistent_bar_count(),
            "bars with high/low outside open/close"
        );
    }
    Ok(LoadedData {
        series,
        fundamentals,
        source,
    })
}
