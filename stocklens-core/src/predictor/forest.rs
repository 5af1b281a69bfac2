//! Random forest regressor: bootstrap-bagged CART trees, averaged.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::{check_training_data, Predict, Regressor, TrainingError};
use super::tree::{RegressionTree, TreeConfig};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    /// Draw each tree's training rows with replacement.
    pub bootstrap: bool,
    pub tree: TreeConfig,
    /// Wall-clock limit on the whole fit, checked between trees.
    pub budget: Option<Duration>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            bootstrap: true,
            tree: TreeConfig::default(),
            budget: None,
        }
    }
}

/// Unfitted forest.
#[derive(Debug, Clone, Default)]
pub struct RandomForest {
    pub config: ForestConfig,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }
}

/// Fitted forest. Prediction is the mean of the trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestModel {
    trees: Vec<RegressionTree>,
}

impl ForestModel {
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForest {
    type Model = ForestModel;

    fn fit(&self, features: &[Vec<f64>], targets: &[f64], seed: u64) -> Result<ForestModel, TrainingError> {
        check_training_data(features, targets)?;
        if self.config.n_estimators == 0 {
            return Err(TrainingError::Fit("forest needs at least one tree".into()));
        }

        let n = targets.len();
        let started = Instant::now();
        // one seed per tree, drawn up front so tree k never depends on tree k-1's draws
        let mut seeder = StdRng::seed_from_u64(seed);
        let tree_seeds: Vec<u64> = (0..self.config.n_estimators).map(|_| seeder.gen()).collect();

        let mut trees = Vec::with_capacity(self.config.n_estimators);
        for (k, tree_seed) in tree_seeds.into_iter().enumerate() {
            if let Some(budget) = self.config.budget {
                if k > 0 && started.elapsed() > budget {
                    return Err(TrainingError::BudgetExceeded {
                        budget,
                        fitted: k,
                        requested: self.config.n_estimators,
                    });
                }
            }

            let mut rng = StdRng::seed_from_u64(tree_seed);
            let samples: Vec<usize> = if self.config.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            trees.push(RegressionTree::fit(features, targets, samples, &self.config.tree, &mut rng));
        }

        debug!(
            trees = trees.len(),
            examples = n,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "random forest fitted"
        );
        Ok(ForestModel { trees })
    }
}

impl Predict for ForestModel {
    fn predict(&self, row: &[f64]) -> f64 {
        self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64
    }
}
