//! Model training module
//!
//! Provides the candidate regressors and the stage that compares them:
//! - Linear regression (OLS with collinear columns aliased out)
//! - Decision trees and Random Forests
//! - Gradient boosting and CatBoost-style symmetric-tree boosting
//! - K-Nearest Neighbors
//! - AdaBoost.R2
//! - Candidate evaluation, selection and the quality gate

mod models;
pub mod metrics;
pub mod linear_models;
pub mod decision_tree;
pub mod random_forest;
pub mod gradient_boosting;
pub mod knn;
pub mod catboost;
pub mod adaboost;
pub mod evaluator;
pub mod trainer;

pub use models::{default_candidates, Candidate, Regressor, TrainedModel};
pub use metrics::{r2_score, RegressionMetrics};
pub use linear_models::LinearRegression;
pub use decision_tree::{DecisionTree, TreeNode};
pub use random_forest::{RandomForest, MaxFeatures};
pub use gradient_boosting::{GradientBoostingRegressor, GradientBoostingConfig};
pub use knn::{KNNRegressor, KNNConfig, DistanceMetric, WeightScheme};
pub use catboost::{CatBoostRegressor, CatBoostConfig};
pub use adaboost::{AdaBoostRegressor, AdaBoostConfig};
pub use evaluator::{evaluate_candidates, evaluate_models, EvaluatedCandidate, ModelReport};
pub use trainer::{split_xy, ModelTrainer, TrainingSummary};
