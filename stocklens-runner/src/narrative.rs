//! Narrative contract for the AI commentary service.
//!
//! The service itself is opaque: it takes prompt text and returns text that
//! should hold a JSON object `{summary, strengths, risks, recommendation}`.
//! Anything else, including a failed call, yields the fixed fallback record.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use stocklens_core::domain::{format_large_number, fundamentals::NOT_AVAILABLE};

use crate::analysis::AnalysisReport;

pub const FALLBACK_SUMMARY: &str = "Unable to generate AI analysis at this time.";
pub const FALLBACK_RECOMMENDATION: &str = "Please try again later.";

pub const SYSTEM_PROMPT: &str =
    "You are a professional financial analyst providing stock market insights.";

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("narrative service unavailable: {0}")]
    Unavailable(String),
    #[error("narrative service call failed: {0}")]
    Call(String),
}

/// Text-in, text-out commentary backend.
pub trait NarrativeService: Send + Sync {
    fn complete(&self, system: &str, prompt: &str) -> Result<String, NarrativeError>;
}

/// Inputs the prompt is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeRequest {
    pub company: String,
    pub sector: Option<String>,
    pub current_price: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub market_cap: Option<f64>,
    pub latest_rsi: Option<f64>,
    #[serde(default)]
    pub rsi_period: Option<usize>,
    pub rsi_zone: Option<String>,
    pub confidence: Option<String>,
}

impl NarrativeRequest {
    pub fn from_report(report: &AnalysisReport) -> Self {
        let fundamentals = report.fundamentals.as_ref();
        Self {
            company: fundamentals
                .and_then(|f| f.long_name.clone())
                .unwrap_or_else(|| report.symbol.clone()),
            sector: fundamentals.and_then(|f| f.sector.clone()),
            current_price: fundamentals
                .and_then(|f| f.current_price)
                .or_else(|| report.last_close()),
            pe_ratio: fundamentals.and_then(|f| f.trailing_pe),
            market_cap: fundamentals.and_then(|f| f.market_cap),
            latest_rsi: report.latest.rsi,
            rsi_period: report.indicators.as_option().and_then(|ind| {
                ind.rsi.name.strip_prefix("rsi_").and_then(|n| n.parse().ok())
            }),
            rsi_zone: report.rsi_zone.map(|z| z.label().to_string()),
            confidence: report
                .forecast
                .as_option()
                .map(|f| f.confidence.tier.to_string()),
        }
    }

    pub fn prompt(&self) -> String {
        let num = |v: Option<f64>, f: fn(f64) -> String| {
            v.filter(|x| x.is_finite())
                .map_or_else(|| NOT_AVAILABLE.to_string(), f)
        };
        format!(
            "Analyze this stock based on the following metrics and provide investment insights:\n\
             \n\
             Company: {company}\n\
             Sector: {sector}\n\
             Current Price: {price}\n\
             P/E Ratio: {pe}\n\
             Market Cap: {cap}\n\
             {rsi_label}: {rsi} ({zone})\n\
             Forecast confidence: {confidence}\n\
             \n\
             Provide analysis in JSON format with the following structure:\n\
             {{\n\
             \x20   \"summary\": \"Brief summary of the stock\",\n\
             \x20   \"strengths\": [\"list\", \"of\", \"strengths\"],\n\
             \x20   \"risks\": [\"list\", \"of\", \"risks\"],\n\
             \x20   \"recommendation\": \"buy/hold/sell with brief explanation\"\n\
             }}\n",
            company = self.company,
            sector = self.sector.as_deref().unwrap_or(NOT_AVAILABLE),
            price = num(self.current_price, |v| format!("${v:.2}")),
            pe = num(self.pe_ratio, |v| format!("{v:.2}")),
            cap = num(self.market_cap, format_large_number),
            rsi_label = self.rsi_period.map_or_else(|| "RSI".to_string(), |p| format!("RSI ({p})")),
            rsi = num(self.latest_rsi, |v| format!("{v:.1}")),
            zone = self.rsi_zone.as_deref().unwrap_or(NOT_AVAILABLE),
            confidence = self.confidence.as_deref().unwrap_or(NOT_AVAILABLE),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeInsights {
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    pub recommendation: String,
}

impl NarrativeInsights {
    pub fn fallback() -> Self {
        Self {
            summary: FALLBACK_SUMMARY.to_string(),
            strengths: Vec::new(),
            risks: Vec::new(),
            recommendation: FALLBACK_RECOMMENDATION.to_string(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }

    /// Parse a service response. Tolerates prose or code fences around the
    /// object; anything unparseable becomes the fallback.
    pub fn parse(response: &str) -> Self {
        let trimmed = response.trim();
        let candidate = match (trimmed.find('{'), trimmed.rfind('}')) {
            (Some(start), Some(end)) if start < end => &trimmed[start..=end],
            _ => trimmed,
        };
        match serde_json::from_str::<Self>(candidate) {
            Ok(insights) => insights,
            Err(e) => {
                warn!(error = %e, "unparseable narrative response");
                Self::fallback()
            }
        }
    }
}

/// Ask `service` for commentary on `request`. Never fails.
pub fn generate_insights(service: &dyn NarrativeService, request: &NarrativeRequest) -> NarrativeInsights {
    match service.complete(SYSTEM_PROMPT, &request.prompt()) {
        Ok(text) => NarrativeInsights::parse(&text),
        Err(e) => {
            warn!(company = %request.company, error = %e, "narrative service failed");
            NarrativeInsights::fallback()
        }
    }
}
