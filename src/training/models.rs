//! Regressor trait and the fixed candidate set

use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::adaboost::{AdaBoostConfig, AdaBoostRegressor};
use super::catboost::{CatBoostConfig, CatBoostRegressor};
use super::decision_tree::DecisionTree;
use super::gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
use super::knn::KNNRegressor;
use super::linear_models::LinearRegression;
use super::metrics::r2_score;
use super::random_forest::RandomForest;

/// Common capability of every regression algorithm in the candidate set
pub trait Regressor: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict one value per row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// R² of the predictions on `x` against `y`
    fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let predictions = self.predict(x)?;
        r2_score(y, &predictions)
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        LinearRegression::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LinearRegression::predict(self, x)
    }
}

impl Regressor for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        DecisionTree::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        DecisionTree::predict(self, x)
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        RandomForest::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        RandomForest::predict(self, x)
    }
}

impl Regressor for GradientBoostingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        GradientBoostingRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        GradientBoostingRegressor::predict(self, x)
    }
}

impl Regressor for KNNRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        KNNRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        KNNRegressor::predict(self, x)
    }
}

impl Regressor for CatBoostRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        CatBoostRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        CatBoostRegressor::predict(self, x)
    }
}

impl Regressor for AdaBoostRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        AdaBoostRegressor::fit(self, x, y).map(|_| ())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        AdaBoostRegressor::predict(self, x)
    }
}

/// A regressor of any supported kind, serializable as a whole
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model")]
pub enum TrainedModel {
    LinearRegression(LinearRegression),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoostingRegressor),
    KNeighbors(KNNRegressor),
    CatBoost(CatBoostRegressor),
    AdaBoost(AdaBoostRegressor),
}

impl TrainedModel {
    fn as_regressor(&self) -> &dyn Regressor {
        match self {
            TrainedModel::LinearRegression(m) => m,
            TrainedModel::DecisionTree(m) => m,
            TrainedModel::RandomForest(m) => m,
            TrainedModel::GradientBoosting(m) => m,
            TrainedModel::KNeighbors(m) => m,
            TrainedModel::CatBoost(m) => m,
            TrainedModel::AdaBoost(m) => m,
        }
    }

    fn as_regressor_mut(&mut self) -> &mut dyn Regressor {
        match self {
            TrainedModel::LinearRegression(m) => m,
            TrainedModel::DecisionTree(m) => m,
            TrainedModel::RandomForest(m) => m,
            TrainedModel::GradientBoosting(m) => m,
            TrainedModel::KNeighbors(m) => m,
            TrainedModel::CatBoost(m) => m,
            TrainedModel::AdaBoost(m) => m,
        }
    }

    /// Short algorithm tag, as written in the artifact
    pub fn kind(&self) -> &'static str {
        match self {
            TrainedModel::LinearRegression(_) => "LinearRegression",
            TrainedModel::DecisionTree(_) => "DecisionTree",
            TrainedModel::RandomForest(_) => "RandomForest",
            TrainedModel::GradientBoosting(_) => "GradientBoosting",
            TrainedModel::KNeighbors(_) => "KNeighbors",
            TrainedModel::CatBoost(_) => "CatBoost",
            TrainedModel::AdaBoost(_) => "AdaBoost",
        }
    }
}

impl Regressor for TrainedModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.as_regressor_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.as_regressor().predict(x)
    }
}

/// A named, unfitted model in the candidate set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub model: TrainedModel,
}

impl Candidate {
    pub fn new(name: impl Into<String>, model: TrainedModel) -> Self {
        Self { name: name.into(), model }
    }
}

/// The fixed candidate set, in evaluation order.
///
/// Every seeded algorithm takes `random_state`, so two calls with the same
/// seed yield identical models after fitting.
pub fn default_candidates(random_state: u64) -> Vec<Candidate> {
    vec![
        Candidate::new(
            "Random Forest",
            TrainedModel::RandomForest(RandomForest::new(100).with_random_state(random_state)),
        ),
        Candidate::new(
            "Decision Tree",
            TrainedModel::DecisionTree(DecisionTree::new().with_random_state(random_state)),
        ),
        Candidate::new(
            "Gradient Boosting",
            TrainedModel::GradientBoosting(GradientBoostingRegressor::new(GradientBoostingConfig {
                random_state,
                ..Default::default()
            })),
        ),
        Candidate::new("Linear Regression", TrainedModel::LinearRegression(LinearRegression::new())),
        Candidate::new("K-Neighbors Regressor", TrainedModel::KNeighbors(KNNRegressor::with_k(5))),
        Candidate::new(
            "CatBoosting Regressor",
            TrainedModel::CatBoost(CatBoostRegressor::new(CatBoostConfig {
                verbose: false,
                ..Default::default()
            })),
        ),
        Candidate::new(
            "AdaBoost Regressor",
            TrainedModel::AdaBoost(AdaBoostRegressor::new(AdaBoostConfig {
                random_state,
                ..Default::default()
            })),
        ),
    ]
}
