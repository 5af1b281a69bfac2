//! Static company fundamentals and the dashboard's key-metric panel.

use serde::{Deserialize, Serialize};

/// Snapshot of static fields reported by the market-data source.
///
/// Every field is optional: providers omit values for funds, indices and
/// delisted tickers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub long_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub currency: Option<String>,
    pub current_price: Option<f64>,
    pub change_percent: Option<f64>,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub volume: Option<u64>,
}

/// The seven headline metrics shown next to the chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub market_cap: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    pub week52_high: Option<f64>,
    pub week52_low: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub volume: Option<u64>,
}

impl KeyMetrics {
    pub fn from_fundamentals(f: &Fundamentals) -> Self {
        Self {
            market_cap: f.market_cap,
            pe_ratio: f.trailing_pe,
            eps: f.trailing_eps,
            week52_high: f.fifty_two_week_high,
            week52_low: f.fifty_two_week_low,
            dividend_yield: f.dividend_yield,
            volume: f.volume,
        }
    }

    /// Display rows in panel order. Absent values render as `N/A`.
    pub fn display_rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Market Cap", opt_display(self.market_cap, format_large_number)),
            ("PE Ratio", opt_display(self.pe_ratio, |v| format!("{v:.2}"))),
            ("EPS", opt_display(self.eps, |v| format!("{v:.2}"))),
            ("52 Week High", opt_display(self.week52_high, |v| format!("{v:.2}"))),
            ("52 Week Low", opt_display(self.week52_low, |v| format!("{v:.2}"))),
            ("Dividend Yield", opt_display(self.dividend_yield, |v| format!("{v:.4}"))),
            (
                "Volume",
                self.volume
                    .map(|v| group_thousands(&v.to_string()))
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
        ]
    }
}

pub const NOT_AVAILABLE: &str = "N/A";

fn opt_display(value: Option<f64>, fmt: impl Fn(f64) -> String) -> String {
    match value {
        Some(v) if v.is_finite() => fmt(v),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Compact dollar formatting: `$2.50T`, `$1.20B`, `$3.00M`, else `$12,345.68`.
pub fn format_large_number(num: f64) -> String {
    if !num.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    if num >= 1e12 {
        format!("${:.2}T", num / 1e12)
    } else if num >= 1e9 {
        format!("${:.2}B", num / 1e9)
    } else if num >= 1e6 {
        format!("${:.2}M", num / 1e6)
    } else {
        let fixed = format!("{:.2}", num.abs());
        let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));
        let sign = if num < 0.0 { "-" } else { "" };
        format!("{sign}${}.{frac_part}", group_thousands(int_part))
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_number_tiers() {
        assert_eq!(format_large_number(2.5e12), "$2.50T");
        assert_eq!(format_large_number(1.2e9), "$1.20B");
        assert_eq!(format_large_number(3_000_000.0), "$3.00M");
        assert_eq!(format_large_number(12_345.678), "$12,345.68");
        assert_eq!(format_large_number(999.0), "$999.00");
        assert_eq!(format_large_number(f64::NAN), "N/A");
    }

    #[test]
    fn key_metrics_render_missing_as_na() {
        let f = Fundamentals {
            market_cap: Some(3.1e12),
            trailing_pe: Some(29.456),
            volume: Some(51_234_567),
            ..Default::default()
        };
        let rows = KeyMetrics::from_fundamentals(&f).display_rows();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0], ("Market Cap", "$3.10T".to_string()));
        assert_eq!(rows[1], ("PE Ratio", "29.46".to_string()));
        assert_eq!(rows[2], ("EPS", "N/A".to_string()));
        assert_eq!(rows[6], ("Volume", "51,234,567".to_string()));
    }
}
