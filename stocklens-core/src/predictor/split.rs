//! Train/test partitioning of the supervised examples.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::model::TrainingError;

/// How examples are assigned to the held-out partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Earliest examples train, latest are held out. No future leaks into training.
    #[default]
    Chronological,
    /// Seeded random permutation, then the first `ceil(n * test_fraction)` are held out.
    Shuffled,
}

/// Example indices of each partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl SplitIndices {
    /// Split `n` examples, holding out `ceil(n * test_fraction)` of them.
    ///
    /// `rng` is only consulted for `Shuffled`.
    pub fn new<R: Rng + ?Sized>(
        n: usize,
        test_fraction: f64,
        strategy: SplitStrategy,
        rng: &mut R,
    ) -> Result<Self, TrainingError> {
        // 35 * 0.2 is 7.000000000000001 in f64; the slack keeps it at 7
        let n_test = (n as f64 * test_fraction - 1e-9).ceil().max(0.0) as usize;
        if n_test == 0 || n_test >= n {
            return Err(TrainingError::EmptyPartition {
                examples: n,
                test_fraction,
            });
        }
        let n_train = n - n_test;

        Ok(match strategy {
            SplitStrategy::Chronological => Self {
                train: (0..n_train).collect(),
                test: (n_train..n).collect(),
            },
            SplitStrategy::Shuffled => {
                let mut order: Vec<usize> = (0..n).collect();
                order.shuffle(rng);
                let train = order.split_off(n_test);
                Self { train, test: order }
            }
        })
    }

    /// Copy the rows and labels of one partition.
    pub fn gather(indices: &[usize], features: &[Vec<f64>], labels: &[f64]) -> (Vec<Vec<f64>>, Vec<f64>) {
        indices
            .iter()
            .map(|&i| (features[i].clone(), labels[i]))
            .unzip()
    }
}
