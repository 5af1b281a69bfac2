//! OHLCV CSV import.
//!
//! Accepts the layout written by common download tools:
//! `Date,Open,High,Low,Close,Volume` with any header case, extra columns
//! (e.g. `Adj Close`) ignored, and dates optionally followed by a time part.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;

use super::provider::{DataError, DataSource, FetchResult};
use crate::domain::PriceBar;

const REQUIRED: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self, DataError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| DataError::Csv(format!("missing column '{name}'")))
        };
        Ok(Self {
            date: find(REQUIRED[0])?,
            open: find(REQUIRED[1])?,
            high: find(REQUIRED[2])?,
            low: find(REQUIRED[3])?,
            close: find(REQUIRED[4])?,
            volume: find(REQUIRED[5])?,
        })
    }
}

fn parse_date(raw: &str, line: u64) -> Result<NaiveDate, DataError> {
    let raw = raw.trim();
    // "2024-01-02", "2024-01-02 00:00:00-05:00", "2024-01-02T00:00:00Z"
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| DataError::Csv(format!("line {line}: bad date '{raw}': {e}")))
}

fn parse_price(raw: &str, column: &str, line: u64) -> Result<f64, DataError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| DataError::Csv(format!("line {line}: bad {column} '{raw}': {e}")))
}

/// Read bars for `symbol` from CSV text. Rows come back sorted by date.
pub fn read_bars<R: Read>(symbol: &str, reader: R) -> Result<FetchResult, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers().map_err(|e| DataError::Csv(e.to_string()))?.clone();
    let cols = Columns::locate(&headers)?;

    let mut bars = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| DataError::Csv(e.to_string()))?;
        let line = record.position().map_or(0, |p| p.line());
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        // blank trailing lines and "null" rows from some exporters
        if cell(cols.close).is_empty() || cell(cols.close).eq_ignore_ascii_case("null") {
            continue;
        }

        let volume = parse_price(cell(cols.volume), "volume", line)?;
        bars.push(PriceBar {
            date: parse_date(cell(cols.date), line)?,
            open: parse_price(cell(cols.open), "open", line)?,
            high: parse_price(cell(cols.high), "high", line)?,
            low: parse_price(cell(cols.low), "low", line)?,
            close: parse_price(cell(cols.close), "close", line)?,
            volume: volume.max(0.0).round() as u64,
        });
    }

    if bars.is_empty() {
        return Err(DataError::Csv("no rows".into()));
    }
    bars.sort_by_key(|b| b.date);
    debug!(symbol, rows = bars.len(), "imported CSV bars");

    Ok(FetchResult {
        symbol: symbol.to_string(),
        bars,
        fundamentals: None,
        source: DataSource::CsvImport,
    })
}

pub fn load_csv(symbol: &str, path: &Path) -> Result<FetchResult, DataError> {
    let file = std::fs::File::open(path)
        .map_err(|e| DataError::Csv(format!("cannot open {}: {e}", path.display())))?;
    read_bars(symbol, file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_standard_layout() {
        let csv = "Date,Open,High,Low,Close,Adj Close,Volume\n\
                   2024-01-02,187.15,188.44,183.89,185.64,184.9,82488700\n\
                   2024-01-03,184.22,185.88,183.43,184.25,183.5,58414500\n";
        let result = read_bars("AAPL", csv.as_bytes()).unwrap();
        assert_eq!(result.source, DataSource::CsvImport);
        assert_eq!(result.bars.len(), 2);
        assert_eq!(result.bars[1].close, 184.25);
        assert_eq!(result.bars[0].volume, 82_488_700);
        assert!(result.fundamentals.is_none());
    }

    #[test]
    fn headers_are_case_insensitive_and_reordered() {
        let csv = "close,VOLUME,date,low,high,open\n10.5,100.0,2024-03-01 00:00:00-05:00,10,11,10.2\n";
        let result = read_bars("X", csv.as_bytes()).unwrap();
        let bar = result.bars[0];
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(bar.open, 10.2);
        assert_eq!(bar.volume, 100);
    }

    #[test]
    fn descending_files_are_sorted() {
        let csv = "Date,Open,High,Low,Close,Volume\n\
                   2024-01-03,2,2,2,2,1\n\
                   2024-01-02,1,1,1,1,1\n";
        let result = read_bars("X", csv.as_bytes()).unwrap();
        assert!(result.bars[0].date < result.bars[1].date);
    }

    #[test]
    fn null_rows_are_skipped() {
        let csv = "Date,Open,High,Low,Close,Volume\n\
                   2024-01-02,null,null,null,null,null\n\
                   2024-01-03,2,2,2,2,1\n";
        assert_eq!(read_bars("X", csv.as_bytes()).unwrap().bars.len(), 1);
    }

    #[test]
    fn missing_column_is_reported() {
        let csv = "Date,Open,High,Low,Volume\n2024-01-02,1,1,1,1\n";
        match read_bars("X", csv.as_bytes()) {
            Err(DataError::Csv(msg)) => assert!(msg.contains("close")),
            other => panic!("expected Csv error, got {other:?}"),
        }
    }

    #[test]
    fn bad_number_names_the_line() {
        let csv = "Date,Open,High,Low,Close,Volume\n2024-01-02,1,1,1,abc,1\n";
        match read_bars("X", csv.as_bytes()) {
            Err(DataError::Csv(msg)) => assert!(msg.contains("line 2"), "{msg}"),
            other => panic!("expected Csv error, got {other:?}"),
        }
    }

    #[test]
    fn header_only_is_empty() {
        assert!(read_bars("X", "Date,Open,High,Low,Close,Volume\n".as_bytes()).is_err());
    }
}
