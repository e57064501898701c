//! AdaBoost regression (AdaBoost.R2)
//!
//! Each round fits a shallow regression tree on a weighted bootstrap of the
//! training set, then shifts weight towards the samples it predicted worst.
//! The ensemble predicts the weighted median of its trees.

use crate::error::{GradecastError, Result};
use super::decision_tree::DecisionTree;
use ndarray::{Array1, Array2, Axis};
use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// AdaBoost configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostConfig {
    /// Maximum number of boosting rounds
    pub n_estimators: usize,
    /// Shrinks the contribution of each tree
    pub learning_rate: f64,
    /// Depth of each weak learner
    pub max_depth: usize,
    pub random_state: u64,
}

impl Default for AdaBoostConfig {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            learning_rate: 1.0,
            max_depth: 3,
            random_state: 42,
        }
    }
}

/// AdaBoost.R2 regressor with linear loss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostRegressor {
    pub config: AdaBoostConfig,
    estimators: Vec<DecisionTree>,
    estimator_weights: Vec<f64>,
    pub is_fitted: bool,
}

impl Default for AdaBoostRegressor {
    fn default() -> Self {
        Self::new(AdaBoostConfig::default())
    }
}

impl AdaBoostRegressor {
    pub fn new(config: AdaBoostConfig) -> Self {
        Self {
            config,
            estimators: Vec::new(),
            estimator_weights: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(GradecastError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(GradecastError::TrainingError(
                "cannot boost on zero samples".to_string(),
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.random_state);
        let mut weights = Array1::from_elem(n_samples, 1.0 / n_samples as f64);
        let lr = self.config.learning_rate;

        self.estimators.clear();
        self.estimator_weights.clear();

        for round in 0..self.config.n_estimators {
            let sampler = WeightedIndex::new(weights.iter().copied())
                .map_err(|e| GradecastError::TrainingError(format!("invalid sample weights: {}", e)))?;
            let sample_indices: Vec<usize> = (0..n_samples).map(|_| sampler.sample(&mut rng)).collect();

            let x_boot = x.select(Axis(0), &sample_indices);
            let y_boot = y.select(Axis(0), &sample_indices);

            let mut tree = DecisionTree::new()
                .with_max_depth(self.config.max_depth)
                .with_random_state(self.config.random_state.wrapping_add(round as u64));
            tree.fit(&x_boot, &y_boot)?;

            // Linear loss, normalized by the largest error
            let predictions = tree.predict(x)?;
            let mut errors: Array1<f64> = (&predictions - y).mapv(f64::abs);
            let error_max = errors.fold(0.0f64, |m, &e| m.max(e));
            if error_max > 0.0 {
                errors /= error_max;
            }

            let avg_loss = (&weights * &errors).sum();

            if avg_loss <= 0.0 {
                // Perfect fit; nothing left to boost
                self.estimators.push(tree);
                self.estimator_weights.push(1.0);
                break;
            }

            if avg_loss >= 0.5 {
                // Too weak; keep it only if the ensemble would otherwise be empty
                if self.estimators.is_empty() {
                    self.estimators.push(tree);
                    self.estimator_weights.push(1.0);
                }
                debug!(round, avg_loss, "AdaBoost stopped early");
                break;
            }

            let beta = avg_loss / (1.0 - avg_loss);
            self.estimators.push(tree);
            self.estimator_weights.push(lr * (1.0 / beta).ln());

            if round + 1 < self.config.n_estimators {
                weights.zip_mut_with(&errors, |w, &e| *w *= beta.powf((1.0 - e) * lr));
                let w_sum = weights.sum();
                if w_sum <= 0.0 || !w_sum.is_finite() {
                    break;
                }
                weights /= w_sum;
            }
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Weighted median of the per-tree predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(GradecastError::ModelNotFitted);
        }

        let all_predictions = self
            .estimators
            .iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let total_weight: f64 = self.estimator_weights.iter().sum();

        let predictions = (0..x.nrows())
            .map(|i| {
                let mut ranked: Vec<(f64, f64)> = all_predictions
                    .iter()
                    .zip(self.estimator_weights.iter())
                    .map(|(preds, &w)| (preds[i], w))
                    .collect();
                ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

                let half = 0.5 * total_weight;
                let mut cumulative = 0.0;
                for &(value, w) in &ranked {
                    cumulative += w;
                    if cumulative >= half {
                        return value;
                    }
                }
                ranked.last().map_or(0.0, |r| r.0)
            })
            .collect();

        Ok(predictions)
    }

    pub fn n_estimators_fitted(&self) -> usize {
        self.estimators.len()
    }

    pub fn estimator_weights(&self) -> &[f64] {
        &self.estimator_weights
    }
}
