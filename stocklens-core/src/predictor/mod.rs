//! Price predictor — next-N-days close forecast with a confidence grade.
//!
//! Per request, one pipeline value moves through
//! `Idle → Prepared → Trained → Forecasted → Done`:
//!
//! 1. **Prepare**: min-max scale the closes, slide a `prediction_window` over
//!    them to build (window → next value) examples.
//! 2. **Train**: 80/20 split, fit a seeded random forest, score R² on both sides.
//! 3. **Forecast**: feed the last window through the model, append each
//!    prediction to the window, repeat `future_days` times, inverse-scale.
//! 4. **Classify**: grade the held-out score into High / Medium / Low.
//!
//! Any failure ends the request in `Failed` with no partial forecast.
//! Nothing is cached or shared between requests.

pub mod confidence;
pub mod features;
pub mod forest;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod scaler;
pub mod split;
pub mod tree;

pub use confidence::{Confidence, ConfidenceTier};
pub use features::{PreparedData, MIN_TRAINING_EXAMPLES};
pub use forest::{ForestConfig, ForestModel, RandomForest};
pub use metrics::{r2_score, regression_metrics, RegressionMetrics};
pub use model::{Predict, Regressor, TrainingError};
pub use pipeline::{
    Forecast, ForecastError, ForecastPoint, ForecastResult, PricePredictor, PredictorConfig,
    TrainedModel,
};
pub use scaler::MinMaxScaler;
pub use split::{SplitIndices, SplitStrategy};
pub use tree::{RegressionTree, TreeConfig};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::SeriesError;

/// Pipeline stages of a single prediction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    Idle,
    Prepared,
    Trained,
    Forecasted,
    Done,
    Failed,
}

/// Why a forecast is unavailable for this request.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("data error: {0}")]
    Data(#[from] SeriesError),

    #[error("insufficient history: {available} closes, need at least {required}")]
    InsufficientHistory { available: usize, required: usize },

    #[error("invalid predictor config: {0}")]
    InvalidConfig(String),

    #[error("training failed: {0}")]
    Training(#[from] TrainingError),

    #[error("forecast failed: {0}")]
    Forecast(#[from] ForecastError),
}

impl PredictError {
    /// The stage the pipeline was trying to reach when it failed.
    pub fn failed_stage(&self) -> PipelineStage {
        match self {
            PredictError::Data(_)
            | PredictError::InsufficientHistory { .. }
            | PredictError::InvalidConfig(_) => PipelineStage::Prepared,
            PredictError::Training(_) => PipelineStage::Trained,
            PredictError::Forecast(_) => PipelineStage::Forecasted,
        }
    }

    /// Short machine-readable category for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::Data(_) => "data",
            PredictError::InsufficientHistory { .. } => "insufficient_history",
            PredictError::InvalidConfig(_) => "invalid_config",
            PredictError::Training(_) => "training",
            PredictError::Forecast(_) => "forecast",
        }
    }
}
