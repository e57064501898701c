//! CART regression tree

use crate::error::{GradecastError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        /// Reduction in squared error achieved by this split
        gain: f64,
    },
}

/// Regression tree grown on squared error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features examined per split; all when `None`
    pub max_features: Option<usize>,
    /// Seed for feature sampling
    pub random_state: u64,
    /// Number of features
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Best split found for one node
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

impl DecisionTree {
    /// Create an unbounded regression tree
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: 42,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Limit the number of features examined at each split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(GradecastError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        if n_samples == 0 {
            return Err(GradecastError::TrainingError(
                "cannot grow a tree on zero samples".to_string(),
            ));
        }

        self.n_features = n_features;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.random_state);
        let mut importances = vec![0.0; n_features];

        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut importances, &mut rng));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
        rng: &mut Xoshiro256PlusPlus,
    ) -> TreeNode {
        let n_samples = indices.len();
        let value = indices.iter().map(|&i| y[i]).sum::<f64>() / n_samples as f64;

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || Self::is_pure(y, indices);

        if should_stop {
            return TreeNode::Leaf { value, n_samples };
        }

        let features = self.sample_features(rng);

        match self.find_best_split(x, y, indices, &features) {
            Some(split) => {
                let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, split.feature_idx]] <= split.threshold);

                importances[split.feature_idx] += split.gain;

                let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, importances, rng));
                let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, importances, rng));

                TreeNode::Split {
                    feature_idx: split.feature_idx,
                    threshold: split.threshold,
                    left,
                    right,
                    n_samples,
                    gain: split.gain,
                }
            }
            None => TreeNode::Leaf { value, n_samples },
        }
    }

    fn sample_features(&self, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        match self.max_features {
            Some(k) if k < self.n_features => {
                let mut features = sample(rng, self.n_features, k).into_vec();
                features.sort_unstable();
                features
            }
            _ => (0..self.n_features).collect(),
        }
    }

    /// Scan each candidate feature in sorted order with running sums.
    ///
    /// Maximizing `sum_l²/n_l + sum_r²/n_r` is the same as minimizing the
    /// children's squared error; the gain reported is the SSE reduction.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        features: &[usize],
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let parent_score = total_sum * total_sum / n as f64;
        let min_leaf = self.min_samples_leaf;

        let feature_results: Vec<Option<SplitCandidate>> = features
            .par_iter()
            .map(|&feature_idx| {
                let mut pairs: Vec<(f64, f64)> = indices
                    .iter()
                    .map(|&i| (x[[i, feature_idx]], y[i]))
                    .collect();
                pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut best: Option<SplitCandidate> = None;
                let mut left_sum = 0.0;

                for pos in 0..n - 1 {
                    left_sum += pairs[pos].1;
                    let n_left = pos + 1;
                    let n_right = n - n_left;

                    if pairs[pos].0 >= pairs[pos + 1].0 {
                        continue;
                    }
                    if n_left < min_leaf || n_right < min_leaf {
                        continue;
                    }

                    let right_sum = total_sum - left_sum;
                    let score = left_sum * left_sum / n_left as f64
                        + right_sum * right_sum / n_right as f64;
                    let gain = score - parent_score;

                    if gain > best.as_ref().map_or(0.0, |b| b.gain) {
                        best = Some(SplitCandidate {
                            feature_idx,
                            threshold: (pairs[pos].0 + pairs[pos + 1].0) / 2.0,
                            gain,
                        });
                    }
                }

                best
            })
            .collect();

        // Strictly greater keeps the lowest feature index on ties
        feature_results
            .into_iter()
            .flatten()
            .fold(None, |acc: Option<SplitCandidate>, cand| match acc {
                Some(best) if best.gain >= cand.gain => Some(best),
                _ => Some(cand),
            })
    }

    fn is_pure(y: &Array1<f64>, indices: &[usize]) -> bool {
        let first = y[indices[0]];
        indices.iter().all(|&i| (y[i] - first).abs() < 1e-12)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(GradecastError::ModelNotFitted)?;

        if x.ncols() != self.n_features {
            return Err(GradecastError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows().into_iter().map(|row| Self::predict_sample(root, row)).collect())
    }

    fn predict_sample(node: &TreeNode, sample: ArrayView1<f64>) -> f64 {
        match node {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                if sample[*feature_idx] <= *threshold {
                    Self::predict_sample(left, sample)
                } else {
                    Self::predict_sample(right, sample)
                }
            }
        }
    }

    /// Get feature importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Get tree depth, counting a lone leaf as 1
    pub fn get_depth(&self) -> usize {
        match &self.root {
            None => 0,
            Some(node) => Self::node_depth(node),
        }
    }

    fn node_depth(node: &TreeNode) -> usize {
        match node {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => {
                1 + Self::node_depth(left).max(Self::node_depth(right))
            }
        }
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        match &self.root {
            None => 0,
            Some(node) => Self::count_leaves(node),
        }
    }

    fn count_leaves(node: &TreeNode) -> usize {
        match node {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => {
                Self::count_leaves(left) + Self::count_leaves(right)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regressor_memorizes_training_data() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 4.0, 9.0, 16.0, 25.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        for (p, a) in predictions.iter().zip(y.iter()) {
            assert!((p - a).abs() < 1e-12);
        }
        assert_eq!(tree.get_n_leaves(), 5);
    }

    #[test]
    fn test_step_function_threshold() {
        let x = array![[0.0], [1.0], [2.0], [10.0], [11.0], [12.0]];
        let y = array![5.0, 5.0, 5.0, 20.0, 20.0, 20.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.get_depth(), 2);
        let preds = tree.predict(&array![[5.9], [6.1]]).unwrap();
        assert_eq!(preds[0], 5.0);
        assert_eq!(preds[1], 20.0);
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![0.0, 1.0, 2.0, 3.0];

        let mut tree = DecisionTree::new().with_max_depth(1);
        tree.fit(&x, &y).unwrap();

        assert!(tree.get_depth() <= 2);
        assert!(tree.get_n_leaves() <= 2);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert_eq!(importances[0], 1.0);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_sampled_features_are_seeded() {
        let x = array![
            [1.0, 3.0, 0.5],
            [2.0, 1.0, 0.1],
            [3.0, 4.0, 0.9],
            [4.0, 2.0, 0.3],
            [5.0, 5.0, 0.7],
        ];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];

        let mut a = DecisionTree::new().with_max_features(1).with_random_state(7);
        let mut b = DecisionTree::new().with_max_features(1).with_random_state(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_predict_before_fit() {
        let tree = DecisionTree::new();
        assert!(matches!(tree.predict(&array![[1.0]]), Err(GradecastError::ModelNotFitted)));
    }

    #[test]
    fn test_shape_mismatch() {
        let mut tree = DecisionTree::new();
        let err = tree.fit(&array![[1.0], [2.0]], &array![1.0]).unwrap_err();
        assert!(matches!(err, GradecastError::ShapeError { .. }));
    }
}
