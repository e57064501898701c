//! CatBoost-style gradient boosting on symmetric trees
//!
//! - Symmetric (oblivious) decision trees: all nodes at the same depth use the same split
//! - Newton leaf values with L2 leaf regularization
//! - Plain boosting mode on a squared-error objective

use crate::error::{GradecastError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatBoostConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub reg_lambda: f64,
    /// Log training loss while fitting
    pub verbose: bool,
}

impl Default for CatBoostConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 6,
            reg_lambda: 3.0,
            verbose: false,
        }
    }
}

/// Symmetric (oblivious) tree: each level uses the same split feature + threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SymmetricTree {
    splits: Vec<(usize, f64)>, // (feature, threshold) per level
    leaf_values: Vec<f64>,     // 2^depth leaf values
}

impl SymmetricTree {
    fn leaf_index(&self, sample: ArrayView1<f64>) -> usize {
        self.splits.iter().fold(0usize, |idx, &(feature, threshold)| {
            idx * 2 + usize::from(sample[feature] > threshold)
        })
    }

    fn predict(&self, sample: ArrayView1<f64>) -> f64 {
        self.leaf_values[self.leaf_index(sample)]
    }
}

/// Per-feature row order, computed once per fit
fn sorted_orders(x: &Array2<f64>) -> Vec<Vec<usize>> {
    (0..x.ncols())
        .into_par_iter()
        .map(|feat| {
            let mut order: Vec<usize> = (0..x.nrows()).collect();
            order.sort_by(|&a, &b| x[[a, feat]].total_cmp(&x[[b, feat]]));
            order
        })
        .collect()
}

fn leaf_score(g: f64, h: f64, reg_lambda: f64) -> f64 {
    g * g / (h + reg_lambda)
}

/// Best threshold for one feature given the current bucket of every row.
///
/// Rows are scanned in sorted order, moving one row at a time from the right
/// side of its bucket to the left; the total gain is updated incrementally.
fn best_threshold_for_feature(
    x: &Array2<f64>,
    feat: usize,
    order: &[usize],
    bucket_of: &[usize],
    bucket_g: &[f64],
    bucket_h: &[f64],
    gradients: &[f64],
    reg_lambda: f64,
) -> Option<(f64, f64)> {
    let n_buckets = bucket_g.len();
    let mut left_g = vec![0.0; n_buckets];
    let mut left_h = vec![0.0; n_buckets];

    let parent: f64 = (0..n_buckets)
        .map(|b| leaf_score(bucket_g[b], bucket_h[b], reg_lambda))
        .sum();
    // All rows start on the right
    let mut children = parent;

    let mut best: Option<(f64, f64)> = None;

    for pos in 0..order.len() - 1 {
        let i = order[pos];
        let b = bucket_of[i];

        let before = leaf_score(left_g[b], left_h[b], reg_lambda)
            + leaf_score(bucket_g[b] - left_g[b], bucket_h[b] - left_h[b], reg_lambda);
        left_g[b] += gradients[i];
        left_h[b] += 1.0;
        let after = leaf_score(left_g[b], left_h[b], reg_lambda)
            + leaf_score(bucket_g[b] - left_g[b], bucket_h[b] - left_h[b], reg_lambda);
        children += after - before;

        let (v, next) = (x[[i, feat]], x[[order[pos + 1], feat]]);
        if v >= next {
            continue;
        }

        let gain = children - parent;
        if gain > best.map_or(1e-12, |(_, g)| g) {
            best = Some(((v + next) / 2.0, gain));
        }
    }

    best
}

fn build_symmetric_tree(
    x: &Array2<f64>,
    orders: &[Vec<usize>],
    gradients: &[f64],
    max_depth: usize,
    reg_lambda: f64,
) -> SymmetricTree {
    let n = x.nrows();
    let mut splits = Vec::with_capacity(max_depth);
    let mut bucket_of = vec![0usize; n];

    for _depth in 0..max_depth {
        let n_buckets = 1usize << splits.len();
        let mut bucket_g = vec![0.0; n_buckets];
        let mut bucket_h = vec![0.0; n_buckets];
        for i in 0..n {
            bucket_g[bucket_of[i]] += gradients[i];
            bucket_h[bucket_of[i]] += 1.0;
        }

        let candidates: Vec<Option<(usize, f64, f64)>> = (0..x.ncols())
            .into_par_iter()
            .map(|feat| {
                best_threshold_for_feature(
                    x, feat, &orders[feat], &bucket_of, &bucket_g, &bucket_h, gradients, reg_lambda,
                )
                .map(|(thr, gain)| (feat, thr, gain))
            })
            .collect();

        // First feature wins ties
        let best = candidates.into_iter().flatten().fold(None, |acc: Option<(usize, f64, f64)>, c| {
            match acc {
                Some(a) if a.2 >= c.2 => Some(a),
                _ => Some(c),
            }
        });

        match best {
            Some((feat, thr, _)) => {
                splits.push((feat, thr));
                for i in 0..n {
                    bucket_of[i] = bucket_of[i] * 2 + usize::from(x[[i, feat]] > thr);
                }
            }
            None => break,
        }
    }

    let n_leaves = 1usize << splits.len();
    let mut leaf_g = vec![0.0; n_leaves];
    let mut leaf_h = vec![0.0; n_leaves];
    for i in 0..n {
        leaf_g[bucket_of[i]] += gradients[i];
        leaf_h[bucket_of[i]] += 1.0;
    }

    let leaf_values = leaf_g
        .iter()
        .zip(leaf_h.iter())
        .map(|(&g, &h)| -g / (h + reg_lambda))
        .collect();

    SymmetricTree { splits, leaf_values }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatBoostRegressor {
    pub config: CatBoostConfig,
    trees: Vec<SymmetricTree>,
    base_prediction: f64,
    n_features: usize,
}

impl Default for CatBoostRegressor {
    fn default() -> Self {
        Self::new(CatBoostConfig::default())
    }
}

impl CatBoostRegressor {
    pub fn new(config: CatBoostConfig) -> Self {
        Self { config, trees: Vec::new(), base_prediction: 0.0, n_features: 0 }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            return Err(GradecastError::TrainingError("Empty dataset".into()));
        }
        if n != y.len() {
            return Err(GradecastError::ShapeError {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }

        self.n_features = x.ncols();
        self.base_prediction = y.sum() / n as f64;
        self.trees.clear();

        let orders = sorted_orders(x);
        let mut predictions = Array1::from_elem(n, self.base_prediction);

        for iteration in 0..self.config.n_estimators {
            let gradients: Vec<f64> = predictions.iter().zip(y.iter()).map(|(&p, &yi)| p - yi).collect();

            let tree = build_symmetric_tree(x, &orders, &gradients, self.config.max_depth, self.config.reg_lambda);

            for (i, row) in x.rows().into_iter().enumerate() {
                predictions[i] += self.config.learning_rate * tree.predict(row);
            }
            self.trees.push(tree);

            if self.config.verbose {
                let rmse = (predictions
                    .iter()
                    .zip(y.iter())
                    .map(|(p, t)| (p - t).powi(2))
                    .sum::<f64>()
                    / n as f64)
                    .sqrt();
                info!(iteration, rmse, "CatBoost iteration");
            }
        }
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() && self.config.n_estimators > 0 {
            return Err(GradecastError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(GradecastError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows()
            .into_iter()
            .map(|row| {
                self.base_prediction
                    + self.trees.iter().map(|t| self.config.learning_rate * t.predict(row)).sum::<f64>()
            })
            .collect())
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
