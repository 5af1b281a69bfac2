//! Property tests for the indicator engine and scaling.
//!
//! 1. SMA shape — `L - w + 1` defined values, `w - 1` leading gaps, exact means
//! 2. RSI bounds — every defined value lies in [0, 100]
//! 3. Flat series — RSI resolves to the zero-loss value, SMAs equal the constant
//! 4. Scaler — fitted values land in [0, 1] and invert back
//! 5. Confidence — tier is monotone in the test score

use proptest::prelude::*;
use stocklens_core::indicators::{relative_strength_index, simple_moving_average, ZERO_LOSS_RSI};
use stocklens_core::predictor::{ConfidenceTier, MinMaxScaler};

fn arb_closes(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..1000.0_f64, 1..max_len)
}

fn tier_rank(t: ConfidenceTier) -> u8 {
    match t {
        ConfidenceTier::Low => 0,
        ConfidenceTier::Medium => 1,
        ConfidenceTier::High => 2,
    }
}

proptest! {
    #[test]
    fn sma_shape_and_values(closes in arb_closes(200), window in 1usize..60) {
        let sma = simple_moving_average(&closes, window).unwrap();
        prop_assert_eq!(sma.len(), closes.len());

        let defined = sma.iter().filter(|v| v.is_some()).count();
        if closes.len() >= window {
            prop_assert_eq!(defined, closes.len() - window + 1);
            prop_assert!(sma[..window - 1].iter().all(|v| v.is_none()));
            for i in window - 1..closes.len() {
                let expected = closes[i + 1 - window..=i].iter().sum::<f64>() / window as f64;
                let got = sma[i].unwrap();
                prop_assert!((got - expected).abs() <= 1e-9 * expected.abs().max(1.0));
            }
        } else {
            prop_assert_eq!(defined, 0);
        }
    }

    #[test]
    fn rsi_stays_in_bounds(closes in arb_closes(200), period in 1usize..30) {
        let rsi = relative_strength_index(&closes, period).unwrap();
        prop_assert_eq!(rsi.len(), closes.len());
        for v in rsi.iter().flatten() {
            prop_assert!((0.0..=100.0).contains(v), "rsi {} out of range", v);
        }
        let defined = rsi.iter().filter(|v| v.is_some()).count();
        prop_assert_eq!(defined, (closes.len() + 1).saturating_sub(period));
    }

    #[test]
    fn flat_series_is_deterministic(price in 1.0..1000.0_f64, len in 60usize..120) {
        let closes = vec![price; len];
        let rsi = relative_strength_index(&closes, 14).unwrap();
        prop_assert!(rsi[13..].iter().all(|v| *v == Some(ZERO_LOSS_RSI)));

        for window in [20, 50] {
            let sma = simple_moving_average(&closes, window).unwrap();
            for v in sma.iter().flatten() {
                prop_assert!((v - price).abs() <= 1e-9 * price);
            }
        }
    }

    #[test]
    fn scaler_maps_into_unit_interval(values in arb_closes(100)) {
        let scaler = MinMaxScaler::fit(&values).unwrap();
        for &v in &values {
            let s = scaler.transform(v);
            prop_assert!((0.0..=1.0).contains(&s));
            prop_assert!((scaler.inverse_transform(s) - v).abs() <= 1e-9 * v.abs().max(1.0));
        }
    }

    #[test]
    fn tier_is_monotone(a in -2.0..1.0_f64, b in -2.0..1.0_f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            tier_rank(ConfidenceTier::from_test_score(lo)) <= tier_rank(ConfidenceTier::from_test_score(hi))
        );
    }
}
