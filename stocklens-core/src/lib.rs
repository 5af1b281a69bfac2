//! StockLens Core — price series, indicators, price prediction, market data.
//!
//! - Domain types (bars, validated series, lookbacks, fundamentals)
//! - Indicator engine: short/long SMA and RSI, aligned with the bars
//! - Price predictor: sliding-window random forest with a confidence grade
//! - Market data providers (Yahoo chart API, CSV import, synthetic walk)
//! - BLAKE3 seed hierarchy for reproducible per-symbol randomness

pub mod data;
pub mod domain;
pub mod indicators;
pub mod predictor;
pub mod rng;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the runner moves across rayon
    /// workers is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceBar>();
        require_sync::<domain::PriceBar>();
        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<domain::Fundamentals>();
        require_sync::<domain::Fundamentals>();

        require_send::<indicators::IndicatorSet>();
        require_sync::<indicators::IndicatorSet>();
        require_send::<indicators::IndicatorSeries>();
        require_sync::<indicators::IndicatorSeries>();

        require_send::<predictor::PricePredictor>();
        require_sync::<predictor::PricePredictor>();
        require_send::<predictor::ForecastResult>();
        require_sync::<predictor::ForecastResult>();
        require_send::<predictor::PredictError>();
        require_sync::<predictor::PredictError>();
        require_send::<predictor::ForestModel>();
        require_sync::<predictor::ForestModel>();

        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();
    }

    #[test]
    fn send_sync_compiles() {
        assert_send_sync();
    }
}
