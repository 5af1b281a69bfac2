//! Relative Strength Index (RSI).
//!
//! Simple (unsmoothed) rolling means of per-bar gains and losses over `period`
//! bars. The first bar has no prior close and counts as a zero change, so RSI
//! shares the SMA warm-up: the first defined value is at bar `period - 1`.
//! RSI = 100 - 100 / (1 + mean_gain / mean_loss)
//! Zero-loss policy: mean_loss == 0 → RSI = 100, flat windows included.

use serde::{Deserialize, Serialize};

use super::indicator::Indicator;
use crate::domain::SeriesError;

/// RSI assigned when the window contains no losses.
pub const ZERO_LOSS_RSI: f64 = 100.0;

/// Chart reference levels.
pub const OVERBOUGHT_LEVEL: f64 = 70.0;
pub const OVERSOLD_LEVEL: f64 = 30.0;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, closes: &[f64]) -> Result<Vec<Option<f64>>, SeriesError> {
        relative_strength_index(closes, self.period)
    }
}

/// RSI of `closes` over a rolling window of `period` bars.
pub fn relative_strength_index(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>, SeriesError> {
    if closes.is_empty() {
        return Err(SeriesError::Empty);
    }
    if period == 0 {
        return Err(SeriesError::InvalidWindow { window: period });
    }

    let n = closes.len();
    let mut result = vec![None; n];
    if n < period {
        return Ok(result);
    }

    // one entry per bar; bar 0 has no delta and contributes zero to both
    let (gains, losses): (Vec<f64>, Vec<f64>) = std::iter::once((0.0, 0.0))
        .chain(closes.windows(2).map(|w| {
            let delta = w[1] - w[0];
            (delta.max(0.0), (-delta).max(0.0))
        }))
        .unzip();

    for (start, (g, l)) in gains.windows(period).zip(losses.windows(period)).enumerate() {
        let mean_gain = g.iter().sum::<f64>() / period as f64;
        let mean_loss = l.iter().sum::<f64>() / period as f64;
        result[start + period - 1] = Some(rsi_from_means(mean_gain, mean_loss));
    }
    Ok(result)
}

fn rsi_from_means(mean_gain: f64, mean_loss: f64) -> f64 {
    if mean_loss == 0.0 {
        ZERO_LOSS_RSI
    } else {
        100.0 - 100.0 / (1.0 + mean_gain / mean_loss)
    }
}

/// Momentum zone of an RSI reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RsiZone {
    Overbought,
    Neutral,
    Oversold,
}

impl RsiZone {
    pub fn classify(rsi: f64) -> Self {
        if rsi >= OVERBOUGHT_LEVEL {
            RsiZone::Overbought
        } else if rsi <= OVERSOLD_LEVEL {
            RsiZone::Oversold
        } else {
            RsiZone::Neutral
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RsiZone::Overbought => "overbought",
            RsiZone::Neutral => "neutral",
            RsiZone::Oversold => "oversold",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn rsi_all_gains_hits_zero_loss_sentinel() {
        let result = relative_strength_index(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0], 3).unwrap();
        assert_eq!(result[1], None);
        assert_eq!(result[2], Some(ZERO_LOSS_RSI));
        assert_eq!(result[5], Some(ZERO_LOSS_RSI));
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let result = relative_strength_index(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0], 3).unwrap();
        assert_approx(result[2].unwrap(), 0.0, 1e-12);
        assert_approx(result[5].unwrap(), 0.0, 1e-12);
    }

    #[test]
    fn rsi_flat_series_uses_sentinel() {
        let result = relative_strength_index(&[50.0; 20], 14).unwrap();
        assert!(result[..13].iter().all(|v| v.is_none()));
        assert!(result[13..].iter().all(|v| *v == Some(ZERO_LOSS_RSI)));
    }

    #[test]
    fn rsi_mixed_matches_hand_computation() {
        // Per-bar changes: 0 (first bar), +0.34, -0.25, -0.48, +0.72
        // Window at bar 2 (bars 0..=2): gains 0.34, losses 0.25
        let closes = [44.0, 44.34, 44.09, 43.61, 44.33];
        let result = relative_strength_index(&closes, 3).unwrap();

        assert!(result[..2].iter().all(|v| v.is_none()));
        let expected2 = 100.0 - 100.0 / (1.0 + 0.34 / 0.25);
        assert_approx(result[2].unwrap(), expected2, 1e-9);
        // Window at bar 3: gains 0.34, losses 0.73
        let expected3 = 100.0 - 100.0 / (1.0 + 0.34 / 0.73);
        assert_approx(result[3].unwrap(), expected3, 1e-9);
        // Window at bar 4: gains 0.72, losses 0.73
        let expected4 = 100.0 - 100.0 / (1.0 + 0.72 / 0.73);
        assert_approx(result[4].unwrap(), expected4, 1e-9);
    }

    #[test]
    fn rsi_warm_up_matches_sma() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let rsi = relative_strength_index(&closes, 14).unwrap();
        let sma = crate::indicators::simple_moving_average(&closes, 14).unwrap();
        let leading = |col: &[Option<f64>]| col.iter().take_while(|v| v.is_none()).count();
        assert_eq!(leading(&rsi), 13);
        assert_eq!(leading(&rsi), leading(&sma));
        assert_eq!(rsi[13], Some(ZERO_LOSS_RSI));
    }

    #[test]
    fn rsi_bounds() {
        let closes = [100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0];
        let result = relative_strength_index(&closes, 3).unwrap();
        for (i, v) in result.iter().enumerate() {
            if let Some(v) = v {
                assert!((0.0..=100.0).contains(v), "RSI out of bounds at bar {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_short_series_all_absent() {
        let result = relative_strength_index(&[1.0, 2.0, 3.0], 14).unwrap();
        assert_eq!(result, vec![None, None, None]);
        let result = relative_strength_index(&[1.0; 13], 14).unwrap();
        assert!(result.iter().all(|v| v.is_none()));
        // exactly `period` bars defines the last one
        let result = relative_strength_index(&[1.0; 14], 14).unwrap();
        assert_eq!(result.iter().filter(|v| v.is_some()).count(), 1);
        assert_eq!(result[13], Some(ZERO_LOSS_RSI));
    }

    #[test]
    fn rsi_errors() {
        assert_eq!(relative_strength_index(&[], 14), Err(SeriesError::Empty));
        assert!(matches!(
            relative_strength_index(&[1.0, 2.0], 0),
            Err(SeriesError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 13);
        assert_eq!(Rsi::new(14).name(), "rsi_14");
    }

    #[test]
    fn zone_boundaries_are_inclusive() {
        assert_eq!(RsiZone::classify(70.0), RsiZone::Overbought);
        assert_eq!(RsiZone::classify(69.9), RsiZone::Neutral);
        assert_eq!(RsiZone::classify(30.0), RsiZone::Oversold);
        assert_eq!(RsiZone::classify(100.0), RsiZone::Overbought);
    }
}
