//! StockLens Runner — analysis orchestration on top of `stocklens-core`.
//!
//! This crate provides:
//! - TOML analysis config with validation
//! - Data loading with CSV / provider / synthetic fallback
//! - Single-ticker analysis reports (indicators + forecast, independently)
//! - Parallel multi-ticker comparison
//! - JSON and CSV export of reports and forecasts
//! - The narrative (AI commentary) request/response contract

pub mod analysis;
pub mod compare;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod narrative;

pub use analysis::{analyze_series, run_analysis, AnalysisError, AnalysisReport, Availability, SCHEMA_VERSION};
pub use compare::{compare_symbols, Comparison, ComparisonFailure, ComparisonRow};
pub use config::{AnalysisConfig, ConfigError};
pub use data_loader::{load_series, LoadError, LoadOptions, LoadedData};
pub use export::{export_chart_csv, export_forecast_csv, export_json, import_json, load_report, save_artifacts};
pub use narrative::{generate_insights, NarrativeError, NarrativeInsights, NarrativeRequest, NarrativeService};
