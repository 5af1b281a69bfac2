//! CART regression tree (squared-error splits).
//!
//! Nodes live in a flat arena; children are indices into it. The tree is
//! grown with an explicit work stack, so depth is bounded by `max_depth` and
//! never by the call stack.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split; `None` examines all of them.
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    depth: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    sse: f64,
}

struct Pending {
    node: usize,
    samples: Vec<usize>,
    depth: usize,
}

impl RegressionTree {
    /// Grow a tree on the rows of `features` listed in `samples`.
    ///
    /// `samples` may repeat indices (bootstrap draws). Callers validate shapes;
    /// `samples` must be non-empty.
    pub fn fit(
        features: &[Vec<f64>],
        targets: &[f64],
        samples: Vec<usize>,
        config: &TreeConfig,
        rng: &mut StdRng,
    ) -> Self {
        let n_features = features.first().map_or(0, |r| r.len());
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut max_depth_seen = 0;
        let mut stack = vec![Pending {
            node: 0,
            samples,
            depth: 0,
        }];

        while let Some(Pending { node, samples, depth }) = stack.pop() {
            max_depth_seen = max_depth_seen.max(depth);
            let value = mean_of(targets, &samples);

            let can_split = samples.len() >= config.min_samples_split.max(2)
                && config.max_depth.map_or(true, |d| depth < d)
                && !is_constant(targets, &samples);

            let best = if can_split {
                let candidates = candidate_features(n_features, config.max_features, rng);
                best_split(features, targets, &samples, &candidates, config.min_samples_leaf.max(1))
            } else {
                None
            };

            let Some(best) = best else {
                nodes[node] = Node::Leaf { value };
                continue;
            };

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                .iter()
                .partition(|&&i| features[i][best.feature] <= best.threshold);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { value: 0.0 });
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[node] = Node::Split {
                feature: best.feature,
                threshold: best.threshold,
                left,
                right,
            };
            stack.push(Pending {
                node: right,
                samples: right_samples,
                depth: depth + 1,
            });
            stack.push(Pending {
                node: left,
                samples: left_samples,
                depth: depth + 1,
            });
        }

        Self {
            nodes,
            depth: max_depth_seen,
        }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

fn mean_of(targets: &[f64], samples: &[usize]) -> f64 {
    samples.iter().map(|&i| targets[i]).sum::<f64>() / samples.len() as f64
}

fn is_constant(targets: &[f64], samples: &[usize]) -> bool {
    let first = targets[samples[0]];
    samples.iter().all(|&i| targets[i] == first)
}

fn candidate_features(n_features: usize, max_features: Option<usize>, rng: &mut StdRng) -> Vec<usize> {
    match max_features {
        Some(k) if k >= 1 && k < n_features => {
            let mut picked = rand::seq::index::sample(rng, n_features, k).into_vec();
            picked.sort_unstable();
            picked
        }
        _ => (0..n_features).collect(),
    }
}

/// Lowest-SSE threshold over the candidate features.
///
/// Thresholds sit midway between consecutive distinct values; ties between
/// features keep the lower feature index.
fn best_split(
    features: &[Vec<f64>],
    targets: &[f64],
    samples: &[usize],
    candidates: &[usize],
    min_leaf: usize,
) -> Option<BestSplit> {
    let n = samples.len();
    let total_sum: f64 = samples.iter().map(|&i| targets[i]).sum();
    let total_sq: f64 = samples.iter().map(|&i| targets[i] * targets[i]).sum();

    let mut best: Option<BestSplit> = None;
    let mut order = samples.to_vec();

    for &f in candidates {
        order.sort_by(|&a, &b| features[a][f].total_cmp(&features[b][f]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 0..n - 1 {
            let y = targets[order[k]];
            left_sum += y;
            left_sq += y * y;

            let n_left = k + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }
            let here = features[order[k]][f];
            let next = features[order[k + 1]][f];
            if here == next {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / n_left as f64)
                + (right_sq - right_sum * right_sum / n_right as f64);

            if best.as_ref().map_or(true, |b| sse < b.sse) {
                let mut threshold = here + (next - here) / 2.0;
                if threshold >= next {
                    threshold = here;
                }
                best = Some(BestSplit {
                    feature: f,
                    threshold,
                    sse,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn fit_all(x: &[Vec<f64>], y: &[f64], config: &TreeConfig) -> RegressionTree {
        let mut rng = StdRng::seed_from_u64(1);
        RegressionTree::fit(x, y, (0..y.len()).collect(), config, &mut rng)
    }

    #[test]
    fn step_function_is_learned_exactly() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..10).map(|i| if i < 5 { 1.0 } else { 3.0 }).collect();
        let tree = fit_all(&x, &y, &TreeConfig::default());

        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict(&[0.0]), 1.0);
        assert_eq!(tree.predict(&[4.4]), 1.0);
        assert_eq!(tree.predict(&[4.6]), 3.0);
        assert_eq!(tree.predict(&[100.0]), 3.0);
    }

    #[test]
    fn full_tree_interpolates_training_points() {
        let x: Vec<Vec<f64>> = (0..16).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let y: Vec<f64> = (0..16).map(|i| (i as f64).sin()).collect();
        let tree = fit_all(&x, &y, &TreeConfig::default());
        for (row, target) in x.iter().zip(&y) {
            assert!((tree.predict(row) - target).abs() < 1e-12);
        }
    }

    #[test]
    fn max_depth_limits_growth() {
        let x: Vec<Vec<f64>> = (0..32).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..32).map(|i| i as f64).collect();
        let config = TreeConfig {
            max_depth: Some(2),
            ..TreeConfig::default()
        };
        let tree = fit_all(&x, &y, &config);
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.leaf_count(), 4);
    }

    #[test]
    fn constant_target_is_single_leaf() {
        let x: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64]).collect();
        let tree = fit_all(&x, &[2.5; 8], &TreeConfig::default());
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.predict(&[-10.0]), 2.5);
    }

    #[test]
    fn identical_features_cannot_split() {
        let x = vec![vec![1.0]; 4];
        let tree = fit_all(&x, &[1.0, 2.0, 3.0, 4.0], &TreeConfig::default());
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.predict(&[1.0]), 2.5);
    }

    #[test]
    fn min_samples_leaf_is_respected() {
        let x: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64]).collect();
        let y = [0.0, 0.0, 0.0, 0.0, 0.0, 10.0];
        let config = TreeConfig {
            min_samples_leaf: 3,
            ..TreeConfig::default()
        };
        let tree = fit_all(&x, &y, &config);
        // the only legal cut is 3 | 3
        assert_eq!(tree.leaf_count(), 2);
        assert!((tree.predict(&[5.0]) - 10.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn predictions_stay_within_target_range() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..20).map(|i| 0.1 * i as f64).collect();
        let tree = fit_all(&x, &y, &TreeConfig::default());
        for probe in [-50.0, 0.5, 7.3, 1e6] {
            let p = tree.predict(&[probe]);
            assert!((0.0..=1.9 + 1e-12).contains(&p));
        }
    }
}
