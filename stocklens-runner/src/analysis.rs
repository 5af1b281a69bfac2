//! Single-ticker analysis — wires loading, indicators, and the predictor.
//!
//! Indicators and forecast are independent failure domains: a series too
//! short to forecast still gets its indicators, and a forecast never
//! depends on the indicator columns.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use stocklens_core::data::provider::{DataProvider, DataSource};
use stocklens_core::domain::{Fundamentals, KeyMetrics, PriceBar, PriceSeries};
use stocklens_core::indicators::{IndicatorSeries, LatestValues, RsiZone};
use stocklens_core::predictor::{ForecastResult, PricePredictor};

use crate::config::{AnalysisConfig, ConfigError};
use crate::data_loader::{load_series, LoadError, LoadOptions};

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Load(#[from] LoadError),
}

/// Outcome of one part of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Availability<T> {
    Available(T),
    Unavailable { kind: String, reason: String },
}

impl<T> Availability<T> {
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Availability::Available(v) => Some(v),
            Availability::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available(_))
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            Availability::Available(_) => None,
            Availability::Unavailable { reason, .. } => Some(reason),
        }
    }
}

/// Everything known about one ticker after an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub source: DataSource,
    pub bars: Vec<PriceBar>,
    pub fundamentals: Option<Fundamentals>,
    pub key_metrics: Option<KeyMetrics>,
    pub indicators: Availability<IndicatorSeries>,
    pub latest: LatestValues,
    pub rsi_zone: Option<RsiZone>,
    pub forecast: Availability<ForecastResult>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl AnalysisReport {
    pub fn is_synthetic(&self) -> bool {
        self.source.is_synthetic()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// Percent change from the first to the last close in the window.
    pub fn period_change_percent(&self) -> Option<f64> {
        let first = self.bars.first()?.close;
        let last = self.bars.last()?.close;
        Some((last - first) / first * 100.0)
    }

    /// Percent change from the last close to the final forecast point.
    pub fn forecast_change_percent(&self) -> Option<f64> {
        let last = self.last_close()?;
        let target = self.forecast.as_option()?.final_point()?.predicted_close;
        Some((target - last) / last * 100.0)
    }
}

/// Analyse an already-loaded series. Never fails: each part reports its own
/// availability.
pub fn analyze_series(
    series: &PriceSeries,
    fundamentals: Option<Fundamentals>,
    source: DataSource,
    config: &AnalysisConfig,
) -> AnalysisReport {
    let symbol = series.symbol();

    let indicators = match config.indicator_set().compute(series) {
        Ok(ind) => Availability::Available(ind),
        Err(e) => {
            warn!(symbol, error = %e, "indicators unavailable");
            Availability::Unavailable {
                kind: "data".into(),
                reason: e.to_string(),
            }
        }
    };
    let latest = indicators.as_option().map(IndicatorSeries::latest).unwrap_or_default();
    let rsi_zone = indicators.as_option().and_then(IndicatorSeries::rsi_zone);

    let predictor = PricePredictor::new(config.predictor_config());
    let forecast = match predictor.predict(series) {
        Ok(result) => Availability::Available(result),
        Err(e) => Availability::Unavailable {
            kind: e.kind().to_string(),
            reason: e.to_string(),
        },
    };

    info!(
        symbol,
        bars = series.len(),
        indicators = indicators.is_available(),
        forecast = forecast.is_available(),
        "analysis complete"
    );

    AnalysisReport {
        schema_version: SCHEMA_VERSION,
        symbol: symbol.to_string(),
        source,
        bars: series.bars().to_vec(),
        key_metrics: fundamentals.as_ref().map(KeyMetrics::from_fundamentals),
        fundamentals,
        indicators,
        latest,
        rsi_zone,
        forecast,
    }
}

/// Load `symbol` and analyse it. Only loading failures are errors.
pub fn run_analysis(
    symbol: &str,
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    config.validate()?;
    let loaded = load_series(symbol, provider, opts)?;
    Ok(analyze_series(
        &loaded.series,
        loaded.fundamentals,
        loaded.source,
        config,
    ))
}
