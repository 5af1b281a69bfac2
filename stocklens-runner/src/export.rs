//! Report export — JSON, chart CSV, forecast CSV.
//!
//! - **JSON**: the full `AnalysisReport` with schema versioning
//! - **Chart CSV**: one row per bar, OHLCV plus indicator columns
//! - **Forecast CSV**: one row per forecast day
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::analysis::{AnalysisReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize AnalysisReport to JSON")
}

pub fn import_json(json: &str) -> Result<AnalysisReport> {
    let report: AnalysisReport =
        serde_json::from_str(json).context("failed to deserialize AnalysisReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.6}")).unwrap_or_default()
}

/// Bars with their indicator values.
///
/// Columns: date, open, high, low, close, volume, then one per indicator
/// (`sma_20`, `sma_50`, `rsi_14` by default). Absent values are empty cells.
pub fn export_chart_csv(report: &AnalysisReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let indicators = report.indicators.as_option();

    let mut header: Vec<String> = ["date", "open", "high", "low", "close", "volume"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    if let Some(ind) = indicators {
        header.extend(ind.columns().iter().map(|c| c.name.clone()));
    }
    wtr.write_record(&header)?;

    for (i, bar) in report.bars.iter().enumerate() {
        let mut row = vec![
            bar.date.to_string(),
            format!("{:.6}", bar.open),
            format!("{:.6}", bar.high),
            format!("{:.6}", bar.low),
            format!("{:.6}", bar.close),
            bar.volume.to_string(),
        ];
        if let Some(ind) = indicators {
            row.extend(ind.columns().iter().map(|c| cell(c.get(i))));
        }
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// `date,predicted_close`. Header only when the forecast is unavailable.
pub fn export_forecast_csv(report: &AnalysisReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "predicted_close"])?;
    if let Some(forecast) = report.forecast.as_option() {
        for p in &forecast.points {
            wtr.write_record([p.date.to_string(), format!("{:.4}", p.predicted_close)])?;
        }
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `{symbol}_stock_data.csv`, `{symbol}_forecast.csv` and
/// `{symbol}_report.json` into `output_dir`, creating it if needed.
///
/// Returns the paths written.
pub fn save_artifacts(report: &AnalysisReport, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let files = [
        (format!("{}_stock_data.csv", report.symbol), export_chart_csv(report)?),
        (format!("{}_forecast.csv", report.symbol), export_forecast_csv(report)?),
        (format!("{}_report.json", report.symbol), export_json(report)?),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, contents) in files {
        let path = output_dir.join(name);
        std::fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

pub fn load_report(path: &Path) -> Result<AnalysisReport> {
    let json = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
