//! StockLens CLI — single-ticker analysis, comparison, and key metrics.
//!
//! Commands:
//! - `analyze` — indicators, 30-day forecast, and confidence for one symbol
//! - `compare` — run `analyze` for several symbols in parallel, print a table
//! - `metrics` — company fundamentals and the key-metrics panel

mod obs;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use stocklens_core::data::provider::DataProvider;
use stocklens_core::data::{CircuitBreaker, YahooProvider};
use stocklens_core::domain::{format_large_number, KeyMetrics, Lookback};
use stocklens_runner::{
    compare_symbols, run_analysis, save_artifacts, AnalysisConfig, AnalysisReport, Availability,
    Comparison, LoadOptions, NarrativeRequest,
};

#[derive(Parser)]
#[command(
    name = "stocklens",
    about = "StockLens — stock indicators and price forecasts"
)]
struct Cli {
    /// Log filter (e.g. info, debug, stocklens_core=trace). STOCKLENS_LOG overrides.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format: text or json.
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    /// History window: 1mo, 3mo, 6mo, 1y, 2y, 5y. Defaults to the config value.
    #[arg(long)]
    period: Option<Lookback>,

    /// Fall back to a seeded synthetic walk when no real data loads.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Do not contact the market data provider.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Path to a TOML analysis config.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse one symbol: indicators, forecast, confidence.
    Analyze {
        symbol: String,

        #[command(flatten)]
        data: DataArgs,

        /// Import bars from this CSV file instead of downloading.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write stock data CSV, forecast CSV, and report JSON here.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the full report as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Also print the prompt for the commentary service.
        #[arg(long, default_value_t = false)]
        show_prompt: bool,
    },
    /// Compare several symbols side by side.
    Compare {
        #[arg(required = true)]
        symbols: Vec<String>,

        #[command(flatten)]
        data: DataArgs,

        /// Print the comparison as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show company fundamentals and key metrics.
    Metrics { symbol: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level, &cli.log_format).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Analyze {
            symbol,
            data,
            csv,
            output_dir,
            json,
            show_prompt,
        } => run_analyze_cmd(&symbol, &data, csv, output_dir, json, show_prompt),
        Commands::Compare { symbols, data, json } => run_compare_cmd(&symbols, &data, json),
        Commands::Metrics { symbol } => run_metrics_cmd(&symbol),
    }
}

fn load_config(data: &DataArgs) -> Result<AnalysisConfig> {
    let mut config = match &data.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(period) = data.period {
        config.data.lookback = period;
    }
    if data.synthetic {
        config.data.synthetic_fallback = true;
    }
    config.validate()?;
    Ok(config)
}

fn load_options(config: &AnalysisConfig) -> LoadOptions {
    LoadOptions {
        synthetic_fallback: config.data.synthetic_fallback,
        seed: config.predictor.seed,
        ..LoadOptions::new(config.data.lookback, chrono::Local::now().date_naive())
    }
}

fn yahoo_provider() -> Result<YahooProvider> {
    let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
    YahooProvider::new(circuit_breaker).context("failed to build Yahoo Finance client")
}

fn run_analyze_cmd(
    symbol: &str,
    data: &DataArgs,
    csv: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    json: bool,
    show_prompt: bool,
) -> Result<()> {
    let config = load_config(data)?;
    let opts = LoadOptions {
        csv_path: csv,
        ..load_options(&config)
    };

    let provider = if data.offline || opts.csv_path.is_some() {
        None
    } else {
        Some(yahoo_provider()?)
    };
    let provider_ref = provider.as_ref().map(|p| p as &dyn DataProvider);

    let symbol = symbol.trim().to_uppercase();
    let report = run_analysis(&symbol, provider_ref, &opts, &config)?;
    tracing::info!(
        symbol = %report.symbol,
        source = ?report.source,
        forecast = report.forecast.is_available(),
        "analysis finished"
    );

    if json {
        println!("{}", stocklens_runner::export_json(&report)?);
    } else {
        print_report(&report);
    }

    if show_prompt {
        println!("--- Commentary prompt ---");
        println!("{}", NarrativeRequest::from_report(&report).prompt());
    }

    if let Some(dir) = output_dir {
        let written = save_artifacts(&report, &dir)?;
        for path in written {
            eprintln!("Saved: {}", path.display());
        }
    }
    Ok(())
}

fn run_compare_cmd(symbols: &[String], data: &DataArgs, json: bool) -> Result<()> {
    let config = load_config(data)?;
    let opts = load_options(&config);

    let provider = if data.offline { None } else { Some(yahoo_provider()?) };
    let provider_ref = provider.as_ref().map(|p| p as &dyn DataProvider);

    let symbols: Vec<String> = symbols.iter().map(|s| s.trim().to_uppercase()).collect();
    let comparison = compare_symbols(&symbols, provider_ref, &opts, &config);

    if json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
    } else {
        print_comparison(&comparison);
    }

    if comparison.rows.is_empty() {
        anyhow::bail!("no symbol could be loaded");
    }
    Ok(())
}

fn run_metrics_cmd(symbol: &str) -> Result<()> {
    let provider = yahoo_provider()?;
    let symbol = symbol.trim().to_uppercase();
    let end = chrono::Local::now().date_naive();
    let fetched = provider
        .fetch(&symbol, Lookback::OneMonth.start_from(end), end)
        .with_context(|| format!("failed to fetch {symbol}"))?;
    let fundamentals = fetched.fundamentals.unwrap_or_default();

    println!();
    println!("=== {} ===", fundamentals.long_name.as_deref().unwrap_or(&symbol));
    if let Some(sector) = &fundamentals.sector {
        println!("Sector:         {sector}");
    }
    if let Some(price) = fundamentals.current_price {
        match fundamentals.change_percent {
            Some(change) => println!("Price:          {price:.2} ({change:+.2}%)"),
            None => println!("Price:          {price:.2}"),
        }
    }
    println!();
    for (label, value) in KeyMetrics::from_fundamentals(&fundamentals).display_rows() {
        println!("{label:<16}{value}");
    }
    println!();
    Ok(())
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => "N/A".to_string(),
    }
}

fn print_report(report: &AnalysisReport) {
    println!();
    println!("=== {} ===", report.symbol);
    if let (Some(first), Some(last)) = (report.bars.first(), report.bars.last()) {
        println!("Period:         {} to {}", first.date, last.date);
    }
    println!("Bars:           {}", report.bars.len());
    println!("Last Close:     {}", fmt_opt(report.last_close(), 2));
    println!("Period Change:  {}%", fmt_opt(report.period_change_percent(), 2));
    if let Some(cap) = report.key_metrics.as_ref().and_then(|m| m.market_cap) {
        println!("Market Cap:     {}", format_large_number(cap));
    }

    println!();
    println!("--- Indicators ---");
    match &report.indicators {
        Availability::Available(_) => {
            println!("SMA (short):    {}", fmt_opt(report.latest.sma_short, 2));
            println!("SMA (long):     {}", fmt_opt(report.latest.sma_long, 2));
            let zone = report.rsi_zone.map_or("N/A", |z| z.label());
            println!("RSI:            {} ({zone})", fmt_opt(report.latest.rsi, 1));
        }
        Availability::Unavailable { reason, .. } => println!("Unavailable: {reason}"),
    }

    println!();
    println!("--- Forecast ---");
    match &report.forecast {
        Availability::Available(forecast) => {
            println!(
                "Confidence:     {} (test R² {:.3}, train R² {:.3})",
                forecast.confidence.tier,
                forecast.confidence.test_score,
                forecast.confidence.train_score
            );
            println!("Test RMSE:      {:.2}", forecast.test_metrics.rmse);
            if let Some(last) = forecast.final_point() {
                println!(
                    "{} days out:    {:.2} on {} ({}%)",
                    forecast.points.len(),
                    last.predicted_close,
                    last.date,
                    fmt_opt(report.forecast_change_percent(), 2)
                );
            }
        }
        Availability::Unavailable { reason, .. } => println!("Unavailable: {reason}"),
    }

    if report.is_synthetic() {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}

fn print_comparison(comparison: &Comparison) {
    println!();
    println!(
        "{:<8} {:>10} {:>9} {:>7} {:>11} {:>9} {:<8}",
        "Symbol", "Close", "Change%", "RSI", "Forecast", "Fcst%", "Conf"
    );
    println!("{}", "-".repeat(68));
    for row in &comparison.rows {
        println!(
            "{:<8} {:>10} {:>9} {:>7} {:>11} {:>9} {:<8}",
            row.symbol,
            fmt_opt(row.last_close, 2),
            fmt_opt(row.period_change_percent, 2),
            fmt_opt(row.rsi, 1),
            fmt_opt(row.forecast_final, 2),
            fmt_opt(row.forecast_change_percent, 2),
            row.confidence.map_or("N/A", |c| c.as_str()),
        );
    }
    if let Some(leader) = comparison.leader() {
        println!();
        println!("Best performer: {}", leader.symbol);
    }
    if comparison.rows.iter().any(|r| r.source.is_synthetic()) {
        println!("WARNING: some rows are based on SYNTHETIC data");
    }
    for failure in &comparison.failures {
        eprintln!("Error for {}: {}", failure.symbol, failure.reason);
    }
    println!();
}
