//! Train, Forecast and Classify stages, and the request-scoped driver.
//!
//! Each stage consumes the previous stage's value, so a `Forecast` can only
//! exist for a model that was trained on prepared data, and nothing from one
//! request can leak into another.

use std::collections::VecDeque;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::confidence::Confidence;
use super::features::{required_history, PreparedData};
use super::forest::{ForestConfig, RandomForest};
use super::metrics::{r2_score, regression_metrics, RegressionMetrics};
use super::model::{Predict, Regressor};
use super::split::{SplitIndices, SplitStrategy};
use super::{PipelineStage, PredictError};
use crate::domain::PriceSeries;
use crate::rng::{SeedHierarchy, SeedStream};

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("model produced a non-finite value at forecast step {step}")]
    NonFinitePrediction { step: usize },

    #[error("inverse scaling produced a non-finite price at forecast step {step}")]
    ScalerInversion { step: usize },

    #[error("forecast date out of range")]
    DateOverflow,
}

#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Closes per input window.
    pub prediction_window: usize,
    /// Forecast horizon in calendar days.
    pub future_days: usize,
    pub test_fraction: f64,
    pub split: SplitStrategy,
    pub forest: ForestConfig,
    /// Master seed; per-symbol seeds derive from it.
    pub seed: u64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            prediction_window: 60,
            future_days: 30,
            test_fraction: 0.2,
            split: SplitStrategy::default(),
            forest: ForestConfig::default(),
            seed: 42,
        }
    }
}

impl PredictorConfig {
    pub fn validate(&self) -> Result<(), PredictError> {
        if self.prediction_window == 0 {
            return Err(PredictError::InvalidConfig("prediction_window must be >= 1".into()));
        }
        if self.future_days == 0 {
            return Err(PredictError::InvalidConfig("future_days must be >= 1".into()));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PredictError::InvalidConfig(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.forest.n_estimators == 0 {
            return Err(PredictError::InvalidConfig("n_estimators must be >= 1".into()));
        }
        Ok(())
    }

    /// Closes a series needs before a forecast is attempted.
    pub fn min_history(&self) -> usize {
        required_history(self.prediction_window)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_close: f64,
}

/// Completed forecast for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub symbol: String,
    /// Date of the last observed close.
    pub generated_from: NaiveDate,
    pub points: Vec<ForecastPoint>,
    pub confidence: Confidence,
    /// Held-out errors in price units.
    pub test_metrics: RegressionMetrics,
    pub train_examples: usize,
    pub test_examples: usize,
}

impl ForecastResult {
    pub fn predicted_closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.predicted_close).collect()
    }

    pub fn final_point(&self) -> Option<&ForecastPoint> {
        self.points.last()
    }
}

/// Output of the Train stage.
#[derive(Debug)]
pub struct TrainedModel<M> {
    prepared: PreparedData,
    model: M,
    train_score: f64,
    test_score: f64,
    test_metrics: RegressionMetrics,
    train_examples: usize,
    test_examples: usize,
}

/// Output of the Forecast stage, not yet graded.
#[derive(Debug, Clone)]
pub struct Forecast {
    symbol: String,
    generated_from: NaiveDate,
    points: Vec<ForecastPoint>,
    train_score: f64,
    test_score: f64,
    test_metrics: RegressionMetrics,
    train_examples: usize,
    test_examples: usize,
}

impl PreparedData {
    /// Split the examples, fit `regressor` on the training side and score
    /// both sides.
    pub fn train<R: Regressor>(
        self,
        regressor: &R,
        config: &PredictorConfig,
        seeds: &SeedHierarchy,
    ) -> Result<TrainedModel<R::Model>, PredictError> {
        let mut split_rng = seeds.rng_for(&self.symbol, SeedStream::Split, 0);
        let split = SplitIndices::new(
            self.example_count(),
            config.test_fraction,
            config.split,
            &mut split_rng,
        )?;
        let (x_train, y_train) = SplitIndices::gather(&split.train, &self.features, &self.labels);
        let (x_test, y_test) = SplitIndices::gather(&split.test, &self.features, &self.labels);

        let model = regressor.fit(&x_train, &y_train, seeds.sub_seed(&self.symbol, SeedStream::Tree, 0))?;

        let train_score = model.score(&x_train, &y_train);
        let test_pred = model.predict_many(&x_test);
        let test_score = r2_score(&y_test, &test_pred);
        let test_metrics = regression_metrics(
            &self.scaler.inverse_all(&y_test),
            &self.scaler.inverse_all(&test_pred),
        );

        info!(
            symbol = %self.symbol,
            train_score,
            test_score,
            test_rmse = test_metrics.rmse,
            "model trained"
        );

        Ok(TrainedModel {
            prepared: self,
            model,
            train_score,
            test_score,
            test_metrics,
            train_examples: split.train.len(),
            test_examples: split.test.len(),
        })
    }
}

impl<M: Predict> TrainedModel<M> {
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn train_score(&self) -> f64 {
        self.train_score
    }

    pub fn test_score(&self) -> f64 {
        self.test_score
    }

    /// Roll the model forward `future_days` steps from the last observed
    /// window, feeding each prediction back in as the newest input.
    pub fn forecast(self, future_days: usize) -> Result<Forecast, PredictError> {
        let prepared = &self.prepared;
        let mut window: VecDeque<f64> = prepared.seed_window().iter().copied().collect();
        let mut row = Vec::with_capacity(prepared.window);
        let mut scaled = Vec::with_capacity(future_days);

        for step in 0..future_days {
            row.clear();
            row.extend(window.iter().copied());
            let next = self.model.predict(&row);
            if !next.is_finite() {
                return Err(ForecastError::NonFinitePrediction { step }.into());
            }
            window.pop_front();
            window.push_back(next);
            scaled.push(next);
        }

        let mut points = Vec::with_capacity(future_days);
        let mut date = prepared.last_date;
        for (step, value) in scaled.into_iter().enumerate() {
            let predicted_close = prepared.scaler.inverse_transform(value);
            if !predicted_close.is_finite() {
                return Err(ForecastError::ScalerInversion { step }.into());
            }
            date = date.succ_opt().ok_or(ForecastError::DateOverflow)?;
            points.push(ForecastPoint { date, predicted_close });
        }

        debug!(symbol = %prepared.symbol, steps = points.len(), "forecast rolled forward");

        Ok(Forecast {
            symbol: self.prepared.symbol,
            generated_from: self.prepared.last_date,
            points,
            train_score: self.train_score,
            test_score: self.test_score,
            test_metrics: self.test_metrics,
            train_examples: self.train_examples,
            test_examples: self.test_examples,
        })
    }
}

impl Forecast {
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Grade the forecast and close the request.
    pub fn finish(self) -> ForecastResult {
        ForecastResult {
            confidence: Confidence::from_scores(self.train_score, self.test_score),
            symbol: self.symbol,
            generated_from: self.generated_from,
            points: self.points,
            test_metrics: self.test_metrics,
            train_examples: self.train_examples,
            test_examples: self.test_examples,
        }
    }
}

/// Runs the whole pipeline for one series per call. Holds configuration
/// only; every model it fits is dropped when the call returns.
#[derive(Debug, Clone)]
pub struct PricePredictor<R: Regressor = RandomForest> {
    config: PredictorConfig,
    regressor: R,
}

impl PricePredictor<RandomForest> {
    pub fn new(config: PredictorConfig) -> Self {
        let regressor = RandomForest::new(config.forest);
        Self { config, regressor }
    }
}

impl Default for PricePredictor<RandomForest> {
    fn default() -> Self {
        Self::new(PredictorConfig::default())
    }
}

impl<R: Regressor> PricePredictor<R> {
    pub fn with_regressor(config: PredictorConfig, regressor: R) -> Self {
        Self { config, regressor }
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn predict(&self, series: &PriceSeries) -> Result<ForecastResult, PredictError> {
        let result = self.run(series);
        if let Err(e) = &result {
            warn!(
                symbol = series.symbol(),
                stage = ?PipelineStage::Failed,
                failed_reaching = ?e.failed_stage(),
                kind = e.kind(),
                error = %e,
                "prediction unavailable"
            );
        }
        result
    }

    fn run(&self, series: &PriceSeries) -> Result<ForecastResult, PredictError> {
        self.config.validate()?;
        let seeds = SeedHierarchy::new(self.config.seed);

        let prepared = PreparedData::prepare(series, self.config.prediction_window)?;
        debug!(symbol = series.symbol(), stage = ?PipelineStage::Prepared, "stage reached");

        let trained = prepared.train(&self.regressor, &self.config, &seeds)?;
        debug!(symbol = series.symbol(), stage = ?PipelineStage::Trained, "stage reached");

        let forecast = trained.forecast(self.config.future_days)?;
        debug!(symbol = series.symbol(), stage = ?PipelineStage::Forecasted, "stage reached");

        let result = forecast.finish();
        debug!(
            symbol = series.symbol(),
            stage = ?PipelineStage::Done,
            tier = %result.confidence.tier,
            "stage reached"
        );
        Ok(result)
    }
}
