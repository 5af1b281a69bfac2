//! Prepare stage: scaling and sliding-window supervised examples.

use chrono::NaiveDate;
use tracing::debug;

use super::scaler::MinMaxScaler;
use super::PredictError;
use crate::domain::{PriceSeries, SeriesError};

/// Fewest (window → label) examples worth splitting 80/20.
///
/// At 20 examples the held-out side has 4 points, the least for which an R²
/// score says anything.
pub const MIN_TRAINING_EXAMPLES: usize = 20;

/// Closes needed before the predictor will run at all.
pub fn required_history(prediction_window: usize) -> usize {
    prediction_window + MIN_TRAINING_EXAMPLES
}

/// Output of the Prepare stage.
///
/// The fitted scaler is the one piece of state every later stage needs: the
/// forecast seed is taken from `scaled` and the output is mapped back through
/// it.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub symbol: String,
    pub last_date: NaiveDate,
    pub window: usize,
    pub scaler: MinMaxScaler,
    pub scaled: Vec<f64>,
    /// Row `i` is `scaled[i .. i + window]`.
    pub features: Vec<Vec<f64>>,
    /// Label `i` is `scaled[i + window]`.
    pub labels: Vec<f64>,
}

impl PreparedData {
    /// Scale the closes of `series` and cut them into supervised examples.
    ///
    /// Fails with `InsufficientHistory` before anything is fitted when the
    /// series cannot yield `MIN_TRAINING_EXAMPLES` examples.
    pub fn prepare(series: &PriceSeries, window: usize) -> Result<Self, PredictError> {
        if window == 0 {
            return Err(SeriesError::InvalidWindow { window }.into());
        }
        let closes = series.closes();
        let required = required_history(window);
        if closes.len() < required {
            return Err(PredictError::InsufficientHistory {
                available: closes.len(),
                required,
            });
        }

        let scaler = MinMaxScaler::fit(&closes).ok_or(SeriesError::Empty)?;
        let scaled = scaler.transform_all(&closes);

        let (features, labels): (Vec<Vec<f64>>, Vec<f64>) = scaled
            .windows(window + 1)
            .map(|w| (w[..window].to_vec(), w[window]))
            .unzip();

        debug!(
            symbol = series.symbol(),
            examples = labels.len(),
            window,
            min = scaler.min(),
            max = scaler.max(),
            "prepared training examples"
        );

        Ok(Self {
            symbol: series.symbol().to_string(),
            last_date: series.last_date(),
            window,
            scaler,
            scaled,
            features,
            labels,
        })
    }

    pub fn example_count(&self) -> usize {
        self.labels.len()
    }

    /// The last `window` scaled closes, the forecast's starting input.
    pub fn seed_window(&self) -> &[f64] {
        &self.scaled[self.scaled.len() - self.window..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::series_from_closes;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 10.0 + i as f64).collect()
    }

    #[test]
    fn builds_n_minus_window_examples() {
        let series = series_from_closes("T", &ramp(40));
        let prepared = PreparedData::prepare(&series, 5).unwrap();
        assert_eq!(prepared.example_count(), 35);
        assert_eq!(prepared.features.len(), 35);
        assert!(prepared.features.iter().all(|row| row.len() == 5));
    }

    #[test]
    fn label_follows_its_window() {
        let series = series_from_closes("T", &ramp(30));
        let p = PreparedData::prepare(&series, 4).unwrap();
        for (i, row) in p.features.iter().enumerate() {
            assert_eq!(row.as_slice(), &p.scaled[i..i + 4]);
            assert_eq!(p.labels[i], p.scaled[i + 4]);
        }
    }

    #[test]
    fn scaled_values_span_unit_interval() {
        let series = series_from_closes("T", &ramp(30));
        let p = PreparedData::prepare(&series, 4).unwrap();
        assert_eq!(p.scaled[0], 0.0);
        assert_eq!(*p.scaled.last().unwrap(), 1.0);
        assert!(p.scaled.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn seed_window_is_the_tail() {
        let series = series_from_closes("T", &ramp(30));
        let p = PreparedData::prepare(&series, 4).unwrap();
        assert_eq!(p.seed_window(), &p.scaled[26..]);
        assert_eq!(p.last_date, series.last_date());
    }

    #[test]
    fn too_short_is_insufficient_history() {
        let series = series_from_closes("T", &ramp(79));
        match PreparedData::prepare(&series, 60) {
            Err(PredictError::InsufficientHistory { available, required }) => {
                assert_eq!(available, 79);
                assert_eq!(required, 80);
            }
            other => panic!("expected InsufficientHistory, got {other:?}"),
        }
        assert!(PreparedData::prepare(&series_from_closes("T", &ramp(80)), 60).is_ok());
    }

    #[test]
    fn zero_window_is_data_error() {
        let series = series_from_closes("T", &ramp(30));
        assert!(matches!(
            PreparedData::prepare(&series, 0),
            Err(PredictError::Data(SeriesError::InvalidWindow { .. }))
        ));
    }
}
