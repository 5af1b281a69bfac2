//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API, with retries and
//! exponential backoff behind a circuit breaker. The chart `meta` block is
//! mapped into `Fundamentals`; a second v10 quoteSummary request fills in
//! sector, industry, market cap, P/E, EPS and dividend yield. A failed
//! summary request keeps the chart fundamentals and does not fail the fetch.
//!
//! Yahoo has no official API and changes its format without notice; CSV
//! import and synthetic data are the fallbacks.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::{Fundamentals, PriceBar};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
    regular_market_volume: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryResult,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    result: Option<Vec<QuoteSummaryData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryData {
    #[serde(default)]
    price: PriceModule,
    #[serde(default)]
    summary_detail: SummaryDetailModule,
    #[serde(default)]
    default_key_statistics: KeyStatisticsModule,
    #[serde(default)]
    asset_profile: AssetProfileModule,
}

/// `{"raw": 29.1, "fmt": "29.10"}`, or `{}` when Yahoo has no value.
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(v: &Option<RawValue>) -> Option<f64> {
    v.as_ref().and_then(|r| r.raw).filter(|x| x.is_finite())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
    currency: Option<String>,
    regular_market_price: Option<RawValue>,
    regular_market_change_percent: Option<RawValue>,
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetailModule {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    dividend_yield: Option<RawValue>,
    fifty_two_week_high: Option<RawValue>,
    fifty_two_week_low: Option<RawValue>,
    market_cap: Option<RawValue>,
    volume: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatisticsModule {
    trailing_eps: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfileModule {
    sector: Option<String>,
    industry: Option<String>,
}

impl QuoteSummaryData {
    fn into_fundamentals(self) -> Fundamentals {
        let (price, detail) = (self.price, self.summary_detail);
        Fundamentals {
            long_name: price.long_name.or(price.short_name),
            sector: self.asset_profile.sector,
            industry: self.asset_profile.industry,
            currency: price.currency,
            current_price: raw(&price.regular_market_price),
            // quoteSummary reports the change as a fraction
            change_percent: raw(&price.regular_market_change_percent).map(|c| c * 100.0),
            market_cap: raw(&price.market_cap).or_else(|| raw(&detail.market_cap)),
            trailing_pe: raw(&detail.trailing_pe),
            trailing_eps: raw(&self.default_key_statistics.trailing_eps),
            fifty_two_week_high: raw(&detail.fifty_two_week_high),
            fifty_two_week_low: raw(&detail.fifty_two_week_low),
            dividend_yield: raw(&detail.dividend_yield),
            volume: raw(&detail.volume).filter(|v| *v >= 0.0).map(|v| v as u64),
        }
    }
}

/// Fields present in `chart` win; `summary` fills the gaps.
fn merge_fundamentals(chart: Option<Fundamentals>, summary: Fundamentals) -> Fundamentals {
    let Some(chart) = chart else {
        return summary;
    };
    Fundamentals {
        long_name: chart.long_name.or(summary.long_name),
        sector: chart.sector.or(summary.sector),
        industry: chart.industry.or(summary.industry),
        currency: chart.currency.or(summary.currency),
        current_price: chart.current_price.or(summary.current_price),
        change_percent: chart.change_percent.or(summary.change_percent),
        market_cap: chart.market_cap.or(summary.market_cap),
        trailing_pe: chart.trailing_pe.or(summary.trailing_pe),
        trailing_eps: chart.trailing_eps.or(summary.trailing_eps),
        fifty_two_week_high: chart.fifty_two_week_high.or(summary.fifty_two_week_high),
        fifty_two_week_low: chart.fifty_two_week_low.or(summary.fifty_two_week_low),
        dividend_yield: chart.dividend_yield.or(summary.dividend_yield),
        volume: chart.volume.or(summary.volume),
    }
}

impl ChartMeta {
    fn into_fundamentals(self) -> Fundamentals {
        let change_percent = match (self.regular_market_price, self.chart_previous_close) {
            (Some(price), Some(prev)) if prev > 0.0 => Some((price - prev) / prev * 100.0),
            _ => None,
        };
        Fundamentals {
            long_name: self.long_name.or(self.short_name),
            currency: self.currency,
            current_price: self.regular_market_price,
            change_percent,
            fifty_two_week_high: self.fifty_two_week_high,
            fifty_two_week_low: self.fifty_two_week_low,
            volume: self.regular_market_volume,
            ..Fundamentals::default()
        }
    }
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end
            .succ_opt()
            .unwrap_or(end)
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    fn quote_summary_url(symbol: &str) -> String {
        format!(
            "https://query2.finance.yahoo.com/v10/finance/quoteSummary/{symbol}\
             ?modules=price,summaryDetail,defaultKeyStatistics,assetProfile"
        )
    }

    fn parse_quote_summary(symbol: &str, resp: QuoteSummaryResponse) -> Result<Fundamentals, DataError> {
        let result = resp.quote_summary.result.ok_or_else(|| match resp.quote_summary.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description)),
            None => DataError::ResponseFormatChanged("empty quoteSummary with no error".into()),
        })?;
        result
            .into_iter()
            .next()
            .map(QuoteSummaryData::into_fundamentals)
            .ok_or_else(|| DataError::ResponseFormatChanged("quoteSummary result is empty".into()))
    }

    fn parse_response(
        symbol: &str,
        resp: ChartResponse,
    ) -> Result<(Vec<PriceBar>, Option<Fundamentals>), DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description)),
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let fundamentals = data.meta.map(ChartMeta::into_fundamentals);

        // A valid symbol with no trading days in range has no timestamps.
        let timestamps = data.timestamp.unwrap_or_default();
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());
        let mut skipped = 0usize;
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;

            let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
            let (Some(open), Some(high), Some(low), Some(close)) =
                (field(&quote.open), field(&quote.high), field(&quote.low), field(&quote.close))
            else {
                // holidays and halted sessions come back as nulls
                skipped += 1;
                continue;
            };

            // intraday duplicates of the last session share its date
            if bars.last().is_some_and(|b: &PriceBar| b.date >= date) {
                skipped += 1;
                continue;
            }

            bars.push(PriceBar {
                date,
                open,
                high,
                low,
                close,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            });
        }

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if skipped > 0 {
            debug!(symbol, skipped, "dropped incomplete bars");
        }
        Ok((bars, fundamentals))
    }

    fn fetch_with_retry(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(Vec<PriceBar>, Option<Fundamentals>), DataError> {
        let chart: ChartResponse = self.get_json(symbol, &Self::chart_url(symbol, start, end))?;
        let (bars, chart_fundamentals) = Self::parse_response(symbol, chart)?;

        let summary = self
            .get_json(symbol, &Self::quote_summary_url(symbol))
            .and_then(|resp| Self::parse_quote_summary(symbol, resp));
        let fundamentals = match summary {
            Ok(summary) => Some(merge_fundamentals(chart_fundamentals, summary)),
            Err(e) => {
                warn!(symbol, error = %e, "quoteSummary unavailable, keeping chart fundamentals");
                chart_fundamentals
            }
        };
        Ok((bars, fundamentals))
    }

    /// GET `url` and decode the JSON body, retrying transient failures.
    fn get_json<T: DeserializeOwned>(&self, symbol: &str, url: &str) -> Result<T, DataError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(symbol, attempt, delay_ms = delay.as_millis() as u64, "retrying");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(self.blocked());
            }

            let resp = match self.client.get(url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(self.blocked());
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after_secs = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited { retry_after_secs });
                continue;
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }
            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let body: T = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
            })?;
            self.circuit_breaker.record_success();
            return Ok(body);
        }

        let err = last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into()));
        warn!(symbol, url, error = %err, "yahoo fetch gave up");
        Err(err)
    }

    fn blocked(&self) -> DataError {
        DataError::CircuitBreakerTripped {
            remaining_secs: self.circuit_breaker.remaining_cooldown().as_secs(),
        }
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
        let (bars, fundamentals) = self.fetch_with_retry(symbol, start, end)?;
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            fundamentals,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<(Vec<PriceBar>, Option<Fundamentals>), DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response("AAPL", resp)
    }

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "currency": "USD",
                    "symbol": "AAPL",
                    "longName": "Apple Inc.",
                    "shortName": "Apple",
                    "regularMarketPrice": 110.0,
                    "chartPreviousClose": 100.0,
                    "fiftyTwoWeekHigh": 199.62,
                    "fiftyTwoWeekLow": 164.08,
                    "regularMarketVolume": 48000000
                },
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open":   [187.15, null, 182.15],
                        "high":   [188.44, null, 183.09],
                        "low":    [183.89, null, 180.88],
                        "close":  [185.64, null, 181.91],
                        "volume": [82488700, null, 71983600]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_bars_and_skips_null_rows() {
        let (bars, _) = parse(SAMPLE).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[0].close, 185.64);
        assert_eq!(bars[1].volume, 71_983_600);
    }

    #[test]
    fn meta_becomes_fundamentals() {
        let (_, fundamentals) = parse(SAMPLE).unwrap();
        let f = fundamentals.unwrap();
        assert_eq!(f.long_name.as_deref(), Some("Apple Inc."));
        assert_eq!(f.currency.as_deref(), Some("USD"));
        assert_eq!(f.current_price, Some(110.0));
        assert!((f.change_percent.unwrap() - 10.0).abs() < 1e-12);
        assert_eq!(f.fifty_two_week_high, Some(199.62));
        assert_eq!(f.volume, Some(48_000_000));
        // the chart meta carries no valuation fields; quoteSummary fills them
        assert_eq!(f.trailing_pe, None);
        assert_eq!(f.sector, None);
    }

    const SUMMARY: &str = r#"{
        "quoteSummary": {
            "result": [{
                "price": {
                    "longName": "Apple Inc.",
                    "shortName": "Apple",
                    "currency": "USD",
                    "regularMarketPrice": {"raw": 189.5, "fmt": "189.50"},
                    "regularMarketChangePercent": {"raw": 0.0125, "fmt": "1.25%"},
                    "marketCap": {"raw": 2950000000000, "fmt": "2.95T", "longFmt": "2,950,000,000,000"}
                },
                "summaryDetail": {
                    "trailingPE": {"raw": 29.123, "fmt": "29.12"},
                    "dividendYield": {"raw": 0.0051, "fmt": "0.51%"},
                    "fiftyTwoWeekHigh": {"raw": 199.62, "fmt": "199.62"},
                    "fiftyTwoWeekLow": {"raw": 164.08, "fmt": "164.08"},
                    "marketCap": {"raw": 2940000000000, "fmt": "2.94T"},
                    "volume": {"raw": 51200000, "fmt": "51.2M"}
                },
                "defaultKeyStatistics": {
                    "trailingEps": {"raw": 6.51, "fmt": "6.51"},
                    "forwardEps": {}
                },
                "assetProfile": {
                    "sector": "Technology",
                    "industry": "Consumer Electronics",
                    "fullTimeEmployees": 161000
                }
            }],
            "error": null
        }
    }"#;

    fn parse_summary(json: &str) -> Result<Fundamentals, DataError> {
        let resp: QuoteSummaryResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_quote_summary("AAPL", resp)
    }

    #[test]
    fn quote_summary_fills_valuation_fields() {
        let f = parse_summary(SUMMARY).unwrap();
        assert_eq!(f.long_name.as_deref(), Some("Apple Inc."));
        assert_eq!(f.sector.as_deref(), Some("Technology"));
        assert_eq!(f.industry.as_deref(), Some("Consumer Electronics"));
        assert_eq!(f.market_cap, Some(2.95e12));
        assert_eq!(f.trailing_pe, Some(29.123));
        assert_eq!(f.trailing_eps, Some(6.51));
        assert_eq!(f.dividend_yield, Some(0.0051));
        assert_eq!(f.volume, Some(51_200_000));
        assert!((f.change_percent.unwrap() - 1.25).abs() < 1e-12);
    }

    #[test]
    fn quote_summary_tolerates_missing_modules() {
        let json = r#"{"quoteSummary":{"result":[{"price":{"currency":"EUR","marketCap":{}}}],"error":null}}"#;
        let f = parse_summary(json).unwrap();
        assert_eq!(f.currency.as_deref(), Some("EUR"));
        assert_eq!(f.market_cap, None);
        assert_eq!(f.trailing_pe, None);
        assert_eq!(f.sector, None);
    }

    #[test]
    fn quote_summary_not_found() {
        let json = r#"{"quoteSummary":{"result":null,"error":{"code":"Not Found","description":"Quote not found for ticker symbol: ZZZZ"}}}"#;
        assert!(matches!(parse_summary(json), Err(DataError::SymbolNotFound { .. })));
    }

    #[test]
    fn chart_and_summary_merge_into_full_fundamentals() {
        let (_, chart) = parse(SAMPLE).unwrap();
        let merged = merge_fundamentals(chart, parse_summary(SUMMARY).unwrap());

        // chart values win where both are present
        assert_eq!(merged.current_price, Some(110.0));
        assert!((merged.change_percent.unwrap() - 10.0).abs() < 1e-12);
        assert_eq!(merged.volume, Some(48_000_000));
        // summary fills what the chart lacks
        assert_eq!(merged.sector.as_deref(), Some("Technology"));
        assert_eq!(merged.industry.as_deref(), Some("Consumer Electronics"));
        assert_eq!(merged.market_cap, Some(2.95e12));
        assert_eq!(merged.trailing_pe, Some(29.123));
        assert_eq!(merged.trailing_eps, Some(6.51));
        assert_eq!(merged.dividend_yield, Some(0.0051));

        let metrics = crate::domain::KeyMetrics::from_fundamentals(&merged);
        assert!(metrics.display_rows().iter().all(|(_, v)| v != "N/A"));
    }

    #[test]
    fn merge_without_chart_meta_uses_summary() {
        let summary = parse_summary(SUMMARY).unwrap();
        assert_eq!(merge_fundamentals(None, summary.clone()), summary);
    }

    #[test]
    fn quote_summary_url_requests_all_modules() {
        let url = YahooProvider::quote_summary_url("MSFT");
        assert!(url.contains("/v10/finance/quoteSummary/MSFT?"));
        assert!(url.contains("modules=price,summaryDetail,defaultKeyStatistics,assetProfile"));
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(matches!(parse(json), Err(DataError::SymbolNotFound { .. })));
    }

    #[test]
    fn other_errors_are_format_changes() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        assert!(matches!(parse(json), Err(DataError::ResponseFormatChanged(_))));
    }

    #[test]
    fn no_timestamps_means_no_data() {
        let json = r#"{"chart":{"result":[{"meta":{"currency":"USD"},"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(matches!(parse(json), Err(DataError::SymbolNotFound { .. })));
    }

    #[test]
    fn chart_url_covers_end_date() {
        let url = YahooProvider::chart_url(
            "SPY",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        assert!(url.contains("/chart/SPY?"));
        assert!(url.contains("period1=1704067200"));
        assert!(url.contains("period2=1706745600"));
        assert!(url.contains("interval=1d"));
    }
}
