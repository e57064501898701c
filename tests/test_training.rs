//! Integration tests for the candidate regressors, evaluation and model selection

use gradecast::config::PipelineConfig;
use gradecast::error::GradecastError;
use gradecast::export::ArtifactStore;
use gradecast::training::{
    default_candidates, evaluate_models, r2_score, Candidate, LinearRegression, ModelReport,
    ModelTrainer, Regressor, TrainedModel,
};
use ndarray::{s, Array1, Array2};

/// Two scaled scores plus a one-hot pair, with a target that depends on all three
fn exam_like(n: usize, offset: usize) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((n, 4), |(i, j)| {
        let r = i + offset;
        match j {
            0 => ((r * 37) % 61) as f64 / 30.0 - 1.0,
            1 => ((r * 53) % 47) as f64 / 23.0 - 1.0,
            2 => (r % 2) as f64,
            _ => 1.0 - (r % 2) as f64,
        }
    });
    let y = Array1::from_shape_fn(n, |i| 66.0 + 9.0 * x[[i, 0]] + 6.0 * x[[i, 1]] + 5.0 * x[[i, 2]]);
    (x, y)
}

// ============================================================================
// Individual regressors
// ============================================================================

#[test]
fn test_every_candidate_fits_a_simple_relation() {
    let (x_train, y_train) = exam_like(240, 0);
    let (x_test, y_test) = exam_like(60, 240);

    for mut candidate in default_candidates(42) {
        candidate.model.fit(&x_train, &y_train).unwrap();
        let train_r2 = candidate.model.score(&x_train, &y_train).unwrap();
        let test_r2 = candidate.model.score(&x_test, &y_test).unwrap();
        assert!(train_r2 > 0.8, "{} train R² = {}", candidate.name, train_r2);
        assert!(test_r2 > 0.6, "{} test R² = {}", candidate.name, test_r2);
    }
}

#[test]
fn test_linear_regression_survives_one_hot_collinearity() {
    let (x, y) = exam_like(100, 0);
    let mut model = LinearRegression::new();
    model.fit(&x, &y).unwrap();

    // columns 2 and 3 sum to one, so one of them is redundant with the intercept
    assert_eq!(model.aliased_columns(), &[3]);
    let predictions = model.predict(&x).unwrap();
    assert!(r2_score(&y, &predictions).unwrap() > 0.999_999);
}

#[test]
fn test_candidates_are_reproducible() {
    let (x, y) = exam_like(80, 0);
    let first: Vec<Array1<f64>> = default_candidates(7)
        .into_iter()
        .map(|mut c| {
            c.model.fit(&x, &y).unwrap();
            c.model.predict(&x).unwrap()
        })
        .collect();
    let second: Vec<Array1<f64>> = default_candidates(7)
        .into_iter()
        .map(|mut c| {
            c.model.fit(&x, &y).unwrap();
            c.model.predict(&x).unwrap()
        })
        .collect();
    assert_eq!(first, second);
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn test_evaluate_models_reports_every_candidate_in_order() {
    let (x_train, y_train) = exam_like(160, 0);
    let (x_test, y_test) = exam_like(40, 160);

    let report = evaluate_models(&x_train, &y_train, &x_test, &y_test, default_candidates(42), true).unwrap();
    let expected: Vec<String> = default_candidates(42).into_iter().map(|c| c.name).collect();
    let names: Vec<String> = report.entries().iter().map(|(n, _)| n.clone()).collect();
    assert_eq!(names, expected);

    let (best, score) = report.best().unwrap();
    assert!(score >= report.get("Decision Tree").unwrap());
    assert!(report.get(best).is_some());
}

#[test]
fn test_report_order_does_not_change_scores() {
    let (x_train, y_train) = exam_like(120, 0);
    let (x_test, y_test) = exam_like(30, 120);

    let forward = evaluate_models(&x_train, &y_train, &x_test, &y_test, default_candidates(42), false).unwrap();
    let mut reversed_candidates = default_candidates(42);
    reversed_candidates.reverse();
    let reversed = evaluate_models(&x_train, &y_train, &x_test, &y_test, reversed_candidates, true).unwrap();

    for (name, score) in forward.entries() {
        assert_eq!(reversed.get(name), Some(*score), "{} changed with order", name);
    }
}

#[test]
fn test_best_ties_resolve_to_first() {
    let report: ModelReport = vec![
        ("A".to_string(), 0.9),
        ("B".to_string(), 0.5),
        ("C".to_string(), 0.9),
    ]
    .into_iter()
    .collect();
    assert_eq!(report.best(), Some(("A", 0.9)));
}

// ============================================================================
// Selection and quality gate
// ============================================================================

fn with_target(x: &Array2<f64>, y: &Array1<f64>) -> Array2<f64> {
    ndarray::concatenate(ndarray::Axis(1), &[x.view(), y.view().insert_axis(ndarray::Axis(1))]).unwrap()
}

#[test]
fn test_trainer_rejects_weak_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::new().with_artifacts_dir(dir.path());

    let (x, _) = exam_like(100, 0);
    let noise = Array1::from_shape_fn(100, |i| ((i * 7919) % 101) as f64);
    let train = with_target(&x.slice(s![..80, ..]).to_owned(), &noise.slice(s![..80]).to_owned());
    let test = with_target(&x.slice(s![80.., ..]).to_owned(), &noise.slice(s![80..]).to_owned());

    let mut store = ArtifactStore::new();
    let err = ModelTrainer::new(config.clone()).initiate(&train, &test, &mut store).unwrap_err();

    match err {
        GradecastError::QualityGate { best_score, threshold, .. } => {
            assert!(best_score < 0.6);
            assert_eq!(threshold, 0.6);
        }
        other => panic!("expected quality gate, got {other}"),
    }
    drop(store);
    assert!(!config.model_path().exists());
}

#[test]
fn test_trainer_picks_linear_for_linear_data() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::new().with_artifacts_dir(dir.path());

    let (x_train, y_train) = exam_like(160, 0);
    let (x_test, y_test) = exam_like(40, 160);
    let trainer = ModelTrainer::new(config.clone()).with_candidates(vec![
        Candidate::new("Linear Regression", TrainedModel::LinearRegression(LinearRegression::new())),
        Candidate::new("Linear Regression (copy)", TrainedModel::LinearRegression(LinearRegression::new())),
    ]);

    let mut store = ArtifactStore::new();
    let summary = trainer
        .initiate(&with_target(&x_train, &y_train), &with_target(&x_test, &y_test), &mut store)
        .unwrap();
    store.commit().unwrap();

    // identical scores: the first candidate wins
    assert_eq!(summary.best_model, "Linear Regression");
    assert!(summary.test_r2 > 0.999);
    assert!(summary.model_path.exists());
}
