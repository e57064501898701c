//! Integration tests for the preprocessor builder and the fitted preprocessor

use gradecast::error::GradecastError;
use gradecast::export::ArtifactStore;
use gradecast::preprocessing::{
    build_preprocessor, DataPreprocessor, ImputeValue, PreprocessingConfig, UnknownCategory,
};
use polars::prelude::*;

fn names(cols: &[&str]) -> Vec<String> {
    cols.iter().map(|s| s.to_string()).collect()
}

fn numeric() -> Vec<String> {
    names(&["reading_score", "writing_score"])
}

fn categorical() -> Vec<String> {
    names(&["gender", "lunch"])
}

fn train_frame() -> DataFrame {
    df!(
        "reading_score" => &[Some(70.0), Some(80.0), None, Some(64.0)],
        "writing_score" => &[Some(68.0), Some(85.0), Some(72.0), Some(60.0)],
        "gender" => &[Some("female"), Some("male"), Some("female"), None],
        "lunch" => &[Some("standard"), Some("free/reduced"), Some("standard"), Some("standard")],
    )
    .unwrap()
}

fn fitted() -> DataPreprocessor {
    let mut preprocessor = build_preprocessor(&numeric(), &categorical(), PreprocessingConfig::default()).unwrap();
    preprocessor.fit(&train_frame()).unwrap();
    preprocessor
}

// ============================================================================
// Builder
// ============================================================================

#[test]
fn test_builder_rejects_empty_lists() {
    let err = build_preprocessor(&[], &categorical(), PreprocessingConfig::default()).unwrap_err();
    assert!(matches!(err, GradecastError::ConfigError(_)));

    let err = build_preprocessor(&numeric(), &[], PreprocessingConfig::default()).unwrap_err();
    assert!(matches!(err, GradecastError::ConfigError(_)));
}

#[test]
fn test_builder_rejects_overlap() {
    let err = build_preprocessor(&numeric(), &names(&["gender", "reading_score"]), PreprocessingConfig::default())
        .unwrap_err();
    assert!(matches!(err, GradecastError::ConfigError(_)));
}

#[test]
fn test_builder_is_pure() {
    let preprocessor = build_preprocessor(&numeric(), &categorical(), PreprocessingConfig::default()).unwrap();
    assert!(!preprocessor.is_fitted());
    assert!(matches!(preprocessor.transform(&train_frame()), Err(GradecastError::ModelNotFitted)));
}

// ============================================================================
// Output shape and determinism
// ============================================================================

#[test]
fn test_output_width_for_any_row_count() {
    let preprocessor = fitted();
    // 2 scaled + gender{female, male} + lunch{free/reduced, standard}
    assert_eq!(preprocessor.n_features_out(), 6);

    let frame = train_frame();
    for rows in [1, 2, 4] {
        let out = preprocessor.transform(&frame.head(Some(rows))).unwrap();
        assert_eq!(out.dim(), (rows, 6));
    }
}

#[test]
fn test_feature_names_order() {
    let preprocessor = fitted();
    assert_eq!(
        preprocessor.feature_names(),
        names(&[
            "reading_score",
            "writing_score",
            "gender_female",
            "gender_male",
            "lunch_free/reduced",
            "lunch_standard",
        ])
    );
}

#[test]
fn test_same_row_twice_is_identical() {
    let preprocessor = fitted();
    let row = train_frame().slice(1, 1);
    let doubled = row.vstack(&row).unwrap();

    let out = preprocessor.transform(&doubled).unwrap();
    assert_eq!(out.row(0), out.row(1));
    assert_eq!(out.row(0), preprocessor.transform(&row).unwrap().row(0));
}

#[test]
fn test_transform_does_not_refit() {
    let preprocessor = fitted();
    let before = serde_json::to_string(&preprocessor).unwrap();

    let test = df!(
        "reading_score" => &[Some(10.0), None],
        "writing_score" => &[Some(99.0), Some(98.0)],
        "gender" => &["male", "male"],
        "lunch" => &["free/reduced", "free/reduced"],
    )
    .unwrap();
    preprocessor.transform(&test).unwrap();

    assert_eq!(serde_json::to_string(&preprocessor).unwrap(), before);
}

// ============================================================================
// Missing values
// ============================================================================

#[test]
fn test_median_imputation_example() {
    let df = df!(
        "reading_score" => &[Some(70.0), Some(80.0), Some(f64::NAN)],
        "writing_score" => &[60.0, 70.0, 80.0],
        "gender" => &["female", "male", "female"],
        "lunch" => &["standard", "standard", "standard"],
    )
    .unwrap();

    let mut preprocessor = build_preprocessor(&numeric(), &categorical(), PreprocessingConfig::default()).unwrap();
    let out = preprocessor.fit_transform(&df).unwrap();

    assert_eq!(out.nrows(), 3);
    assert!(out.iter().all(|v| v.is_finite()));

    let fill = preprocessor.numeric_imputer().fill_value("reading_score").unwrap();
    assert_eq!(fill, &ImputeValue::Numeric(75.0));

    // Imputed row sits at the mean of [70, 80, 75]
    assert!(out[[2, 0]].abs() < 1e-12);
}

#[test]
fn test_missing_category_uses_most_frequent() {
    let preprocessor = fitted();
    let out = preprocessor.transform(&train_frame()).unwrap();
    // row 3 has no gender; "female" is the most frequent value
    assert_eq!(out[[3, 2]], 1.0);
    assert_eq!(out[[3, 3]], 0.0);
}

// ============================================================================
// Unknown categories
// ============================================================================

fn unseen_lunch() -> DataFrame {
    df!(
        "reading_score" => &[70.0],
        "writing_score" => &[70.0],
        "gender" => &["male"],
        "lunch" => &["catered"],
    )
    .unwrap()
}

#[test]
fn test_unknown_category_fails_by_default() {
    let err = fitted().transform(&unseen_lunch()).unwrap_err();
    assert!(matches!(err, GradecastError::UnknownCategory { column, value } if column == "lunch" && value == "catered"));
}

#[test]
fn test_unknown_category_ignore_policy() {
    let config = PreprocessingConfig::default().with_unknown_category(UnknownCategory::Ignore);
    let mut preprocessor = build_preprocessor(&numeric(), &categorical(), config).unwrap();
    preprocessor.fit(&train_frame()).unwrap();

    let out = preprocessor.transform(&unseen_lunch()).unwrap();
    assert_eq!(out[[0, 4]], 0.0);
    assert_eq!(out[[0, 5]], 0.0);
    assert_eq!(out[[0, 3]], 1.0);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_reloaded_preprocessor_transforms_identically() {
    let preprocessor = fitted();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preprocessor.json");

    let mut store = ArtifactStore::new();
    store.stage(&path, &preprocessor).unwrap();
    store.commit().unwrap();

    let reloaded = DataPreprocessor::load(&path).unwrap();
    let held_out = df!(
        "reading_score" => &[Some(77.7), None],
        "writing_score" => &[Some(61.3), Some(90.1)],
        "gender" => &[Some("male"), None],
        "lunch" => &["free/reduced", "standard"],
    )
    .unwrap();

    assert_eq!(
        preprocessor.transform(&held_out).unwrap(),
        reloaded.transform(&held_out).unwrap()
    );
}

#[test]
fn test_missing_column_is_schema_error() {
    let preprocessor = fitted();
    let df = train_frame().drop("lunch").unwrap();
    let err = preprocessor.transform(&df).unwrap_err();
    assert!(matches!(err, GradecastError::SchemaError { .. }));
}
