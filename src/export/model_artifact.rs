//! Persisted form of the selected model

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::artifacts::load_json;
use crate::error::{GradecastError, Result};
use crate::training::{Regressor, TrainedModel};

/// The fitted winning model plus what is needed to trust it later
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Candidate name, e.g. "Linear Regression"
    pub name: String,
    /// R² on the test split at selection time
    pub test_r2: f64,
    /// Width of the feature matrix the model expects
    pub n_features: usize,
    pub created_at: DateTime<Utc>,
    pub model: TrainedModel,
}

impl ModelArtifact {
    pub fn new(name: impl Into<String>, model: TrainedModel, test_r2: f64, n_features: usize) -> Self {
        Self {
            name: name.into(),
            test_r2,
            n_features,
            created_at: Utc::now(),
            model,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_json(path)
    }

    /// Predict with the stored model after checking the feature width
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.n_features {
            return Err(GradecastError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        self.model.predict(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ArtifactStore;
    use crate::training::LinearRegression;
    use ndarray::array;

    #[test]
    fn test_save_and_load() {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0]];
        let y = array![3.0, 6.0, 7.0, 10.0];
        let mut model = TrainedModel::LinearRegression(LinearRegression::new());
        model.fit(&x, &y).unwrap();

        let artifact = ModelArtifact::new("Linear Regression", model, 1.0, 2);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let mut store = ArtifactStore::new();
        store.stage(&path, &artifact).unwrap();
        store.commit().unwrap();

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded.name, "Linear Regression");
        assert_eq!(loaded.created_at, artifact.created_at);
        let diff = (&loaded.predict(&x).unwrap() - &artifact.predict(&x).unwrap()).mapv(f64::abs);
        assert!(diff.iter().all(|d| *d < 1e-9));
    }

    #[test]
    fn test_predict_checks_width() {
        let artifact = ModelArtifact::new(
            "Linear Regression",
            TrainedModel::LinearRegression(LinearRegression::new()),
            0.0,
            3,
        );
        let result = artifact.predict(&array![[1.0, 2.0]]);
        assert!(matches!(result, Err(GradecastError::ShapeError { .. })));
    }
}
