//! Error types for the gradecast pipeline

use thiserror::Error;

/// Result type alias for gradecast operations
pub type Result<T> = std::result::Result<T, GradecastError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum GradecastError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Schema error on column '{column}': {reason}")]
    SchemaError { column: String, reason: String },

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Candidate '{candidate}' failed: {source}")]
    FitError {
        candidate: String,
        #[source]
        source: Box<GradecastError>,
    },

    #[error("No adequate model found: best was '{best_model}' with R² {best_score:.4}, below threshold {threshold}")]
    QualityGate {
        best_model: String,
        best_score: f64,
        threshold: f64,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Computation error: {0}")]
    ComputationError(String),
}

impl GradecastError {
    /// Shorthand for a schema error on `column`
    pub fn schema(column: impl Into<String>, reason: impl Into<String>) -> Self {
        GradecastError::SchemaError {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an estimator failure with the name of the candidate that raised it
    pub fn fit(candidate: impl Into<String>, source: GradecastError) -> Self {
        GradecastError::FitError {
            candidate: candidate.into(),
            source: Box::new(source),
        }
    }

    /// True for the one expected business failure: no candidate passed the gate
    pub fn is_quality_gate(&self) -> bool {
        matches!(self, GradecastError::QualityGate { .. })
    }
}

impl From<polars::error::PolarsError> for GradecastError {
    fn from(err: polars::error::PolarsError) -> Self {
        GradecastError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for GradecastError {
    fn from(err: serde_json::Error) -> Self {
        GradecastError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for GradecastError {
    fn from(err: ndarray::ShapeError) -> Self {
        GradecastError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GradecastError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GradecastError = io_err.into();
        assert!(matches!(err, GradecastError::IoError(_)));
    }

    #[test]
    fn test_fit_error_keeps_candidate_and_cause() {
        let err = GradecastError::fit("K-Neighbors", GradecastError::ModelNotFitted);
        assert!(err.to_string().contains("K-Neighbors"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_quality_gate_flag() {
        let err = GradecastError::QualityGate {
            best_model: "Decision Tree".to_string(),
            best_score: 0.41,
            threshold: 0.6,
        };
        assert!(err.is_quality_gate());
        assert!(!GradecastError::ModelNotFitted.is_quality_gate());
    }
}
