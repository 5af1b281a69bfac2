//! Analysis configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) reproduces the
//! stock dashboard: SMA 20/50, RSI 14, a 60-close window, 30 forecast days,
//! 100 trees with seed 42, one year of history.
//!
//! ```toml
//! [indicators]
//! sma_short = 20
//! sma_long = 50
//! rsi_period = 14
//!
//! [predictor]
//! prediction_window = 60
//! future_days = 30
//! test_fraction = 0.2
//! split = "chronological"   # or "shuffled"
//! n_estimators = 100
//! max_depth = 12            # omit for fully grown trees
//! min_samples_leaf = 1
//! seed = 42
//! training_budget_secs = 20
//!
//! [data]
//! lookback = "1y"
//! synthetic_fallback = false
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stocklens_core::domain::Lookback;
use stocklens_core::indicators::{IndicatorSet, DEFAULT_RSI_PERIOD, DEFAULT_SMA_LONG, DEFAULT_SMA_SHORT};
use stocklens_core::predictor::{ForestConfig, PredictorConfig, SplitStrategy, TreeConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub indicators: IndicatorsConfig,
    pub predictor: PredictorSection,
    pub data: DataConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndicatorsConfig {
    pub sma_short: usize,
    pub sma_long: usize,
    pub rsi_period: usize,
}

impl Default for IndicatorsConfig {
    fn default() -> Self {
        Self {
            sma_short: DEFAULT_SMA_SHORT,
            sma_long: DEFAULT_SMA_LONG,
            rsi_period: DEFAULT_RSI_PERIOD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PredictorSection {
    pub prediction_window: usize,
    pub future_days: usize,
    pub test_fraction: f64,
    pub split: SplitStrategy,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub seed: u64,
    pub training_budget_secs: Option<u64>,
}

impl Default for PredictorSection {
    fn default() -> Self {
        let defaults = PredictorConfig::default();
        Self {
            prediction_window: defaults.prediction_window,
            future_days: defaults.future_days,
            test_fraction: defaults.test_fraction,
            split: defaults.split,
            n_estimators: defaults.forest.n_estimators,
            max_depth: defaults.forest.tree.max_depth,
            min_samples_leaf: defaults.forest.tree.min_samples_leaf,
            seed: defaults.seed,
            training_budget_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub lookback: Lookback,
    /// Generate a synthetic walk when no real data can be loaded.
    pub synthetic_fallback: bool,
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ind = &self.indicators;
        for (name, value) in [
            ("indicators.sma_short", ind.sma_short),
            ("indicators.sma_long", ind.sma_long),
            ("indicators.rsi_period", ind.rsi_period),
            ("predictor.prediction_window", self.predictor.prediction_window),
            ("predictor.future_days", self.predictor.future_days),
            ("predictor.n_estimators", self.predictor.n_estimators),
            ("predictor.min_samples_leaf", self.predictor.min_samples_leaf),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be >= 1")));
            }
        }
        if ind.sma_short >= ind.sma_long {
            return Err(ConfigError::Invalid(format!(
                "indicators.sma_short ({}) must be below sma_long ({})",
                ind.sma_short, ind.sma_long
            )));
        }
        let f = self.predictor.test_fraction;
        if !(f > 0.0 && f < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "predictor.test_fraction must be in (0, 1), got {f}"
            )));
        }
        if self.predictor.max_depth == Some(0) {
            return Err(ConfigError::Invalid("predictor.max_depth must be >= 1".into()));
        }
        if self.predictor.training_budget_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "predictor.training_budget_secs must be >= 1 (omit it for no limit)".into(),
            ));
        }
        Ok(())
    }

    pub fn indicator_set(&self) -> IndicatorSet {
        IndicatorSet::new(
            self.indicators.sma_short,
            self.indicators.sma_long,
            self.indicators.rsi_period,
        )
    }

    pub fn predictor_config(&self) -> PredictorConfig {
        let p = &self.predictor;
        PredictorConfig {
            prediction_window: p.prediction_window,
            future_days: p.future_days,
            test_fraction: p.test_fraction,
            split: p.split,
            forest: ForestConfig {
                n_estimators: p.n_estimators,
                bootstrap: true,
                tree: TreeConfig {
                    max_depth: p.max_depth,
                    min_samples_leaf: p.min_samples_leaf,
                    ..TreeConfig::default()
                },
                budget: p.training_budget_secs.map(Duration::from_secs),
            },
            seed: p.seed,
        }
    }
}
