//! Multi-ticker comparison.
//!
//! Each ticker runs the full analysis on the rayon pool. Pipelines share
//! nothing; per-symbol seeds come from the seed hierarchy, so the outcome for
//! one ticker does not depend on which others are in the list or on thread
//! scheduling. Results are combined only after every ticker has finished.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use stocklens_core::data::provider::{DataProvider, DataSource};
use stocklens_core::indicators::RsiZone;
use stocklens_core::predictor::ConfidenceTier;

use crate::analysis::{run_analysis, AnalysisReport};
use crate::config::AnalysisConfig;
use crate::data_loader::LoadOptions;

/// One row of the comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub symbol: String,
    pub source: DataSource,
    pub last_close: Option<f64>,
    pub period_change_percent: Option<f64>,
    pub rsi: Option<f64>,
    pub rsi_zone: Option<RsiZone>,
    pub forecast_final: Option<f64>,
    pub forecast_change_percent: Option<f64>,
    pub confidence: Option<ConfidenceTier>,
    /// Why the forecast is missing, if it is.
    pub forecast_note: Option<String>,
}

impl ComparisonRow {
    pub fn from_report(report: &AnalysisReport) -> Self {
        let forecast = report.forecast.as_option();
        Self {
            symbol: report.symbol.clone(),
            source: report.source,
            last_close: report.last_close(),
            period_change_percent: report.period_change_percent(),
            rsi: report.latest.rsi,
            rsi_zone: report.rsi_zone,
            forecast_final: forecast.and_then(|f| f.final_point()).map(|p| p.predicted_close),
            forecast_change_percent: report.forecast_change_percent(),
            confidence: forecast.map(|f| f.confidence.tier),
            forecast_note: report.forecast.unavailable_reason().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonFailure {
    pub symbol: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// In the order the symbols were given.
    pub rows: Vec<ComparisonRow>,
    pub failures: Vec<ComparisonFailure>,
}

impl Comparison {
    /// Best period performer among the loaded tickers.
    pub fn leader(&self) -> Option<&ComparisonRow> {
        self.rows
            .iter()
            .filter(|r| r.period_change_percent.is_some_and(f64::is_finite))
            .max_by(|a, b| {
                a.period_change_percent
                    .unwrap_or(f64::NEG_INFINITY)
                    .total_cmp(&b.period_change_percent.unwrap_or(f64::NEG_INFINITY))
            })
    }
}

pub fn compare_symbols(
    symbols: &[String],
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
    config: &AnalysisConfig,
) -> Comparison {
    let outcomes: Vec<(String, Result<ComparisonRow, String>)> = symbols
        .par_iter()
        .map(|symbol| {
            let row = run_analysis(symbol, provider, opts, config)
                .map(|report| ComparisonRow::from_report(&report))
                .map_err(|e| e.to_string());
            (symbol.clone(), row)
        })
        .collect();

    let mut comparison = Comparison::default();
    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(row) => comparison.rows.push(row),
            Err(reason) => comparison.failures.push(ComparisonFailure { symbol, reason }),
        }
    }
    info!(
        loaded = comparison.rows.len(),
        failed = comparison.failures.len(),
        "comparison complete"
    );
    comparison
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stocklens_core::domain::Lookback;

    fn synthetic_opts() -> LoadOptions {
        LoadOptions {
            synthetic_fallback: true,
            ..LoadOptions::new(Lookback::SixMonths, NaiveDate::from_ymd_opt(2024, 6, 28).unwrap())
        }
    }

    fn quick_config() -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.predictor.n_estimators = 8;
        config.predictor.prediction_window = 20;
        config.predictor.future_days = 5;
        config
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rows_follow_input_order() {
        let result = compare_symbols(&symbols(&["CCC", "AAA", "BBB"]), None, &synthetic_opts(), &quick_config());
        let order: Vec<&str> = result.rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, ["CCC", "AAA", "BBB"]);
        assert!(result.failures.is_empty());
        assert!(result.rows.iter().all(|r| r.source == DataSource::Synthetic));
        assert!(result.rows.iter().all(|r| r.confidence.is_some()));
    }

    #[test]
    fn result_is_independent_of_other_tickers() {
        let config = quick_config();
        let alone = compare_symbols(&symbols(&["AAA"]), None, &synthetic_opts(), &config);
        let crowd = compare_symbols(&symbols(&["ZZZ", "AAA", "MMM"]), None, &synthetic_opts(), &config);
        assert_eq!(alone.rows[0], crowd.rows[1]);
    }

    #[test]
    fn failures_are_collected_not_fatal() {
        let opts = LoadOptions::new(Lookback::OneYear, NaiveDate::from_ymd_opt(2024, 6, 28).unwrap());
        let result = compare_symbols(&symbols(&["AAA", "BBB"]), None, &opts, &quick_config());
        assert!(result.rows.is_empty());
        assert_eq!(result.failures.len(), 2);
        assert!(result.leader().is_none());
    }

    #[test]
    fn leader_has_the_best_period_change() {
        let result = compare_symbols(&symbols(&["AAA", "BBB", "CCC"]), None, &synthetic_opts(), &quick_config());
        let leader = result.leader().unwrap();
        let best = result
            .rows
            .iter()
            .filter_map(|r| r.period_change_percent)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(leader.period_change_percent, Some(best));
    }
}
