//! gradecast CLI module
//!
//! Command-line interface for ingestion, transformation, training and
//! artifact inspection.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::error::GradecastError;
use crate::export::ModelArtifact;
use crate::pipeline::TrainingPipeline;
use crate::preprocessing::DataPreprocessor;
use crate::training::ModelReport;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<16} {}", muted(key), val.white());
}

fn print_report(report: &ModelReport, best: &str) {
    println!();
    for (name, score) in report.entries() {
        let marker = if name == best { ok("★") } else { dim(" ") };
        println!("  {} {:<24} {}", marker, name, format!("{:.4}", score).white());
    }
    println!();
}

// ─── Arguments ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "gradecast")]
#[command(author, version, about = "Exam-score regression training pipeline", long_about = None)]
pub struct Cli {
    /// Directory that receives every artifact
    #[arg(long, global = true)]
    pub artifacts_dir: Option<PathBuf>,

    /// JSON pipeline configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a raw CSV into train and test CSVs
    Ingest {
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Fit the preprocessor on the training CSV and save it
    Transform {
        #[arg(long)]
        train: PathBuf,

        #[arg(long)]
        test: PathBuf,
    },

    /// Transform, train every candidate and save the best model
    Train {
        #[arg(long)]
        train: PathBuf,

        #[arg(long)]
        test: PathBuf,
    },

    /// Ingest a raw CSV, then transform and train
    Run {
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Print a summary of a saved preprocessor or model
    Inspect {
        #[arg(short, long)]
        artifact: PathBuf,
    },
}

impl Cli {
    /// Defaults, overlaid by `--config`, overlaid by `--artifacts-dir`
    pub fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(dir) = &self.artifacts_dir {
            config = config.with_artifacts_dir(dir);
        }
        Ok(config)
    }
}

/// Dispatch a parsed command line
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.pipeline_config()?;
    match &cli.command {
        Commands::Ingest { data } => cmd_ingest(config, data),
        Commands::Transform { train, test } => cmd_transform(config, train, test),
        Commands::Train { train, test } => cmd_train(config, train, test),
        Commands::Run { data } => cmd_run(config, data),
        Commands::Inspect { artifact } => cmd_inspect(artifact),
    }
}

pub fn cmd_ingest(config: PipelineConfig, data: &Path) -> anyhow::Result<()> {
    section("Ingest");
    let pipeline = TrainingPipeline::new(config)?;

    step_run("Splitting data");
    let start = Instant::now();
    let out = pipeline
        .ingest(data)
        .with_context(|| format!("ingesting {}", data.display()))?;
    step_done(&format!("{:?}", start.elapsed()));

    kv("Train rows", &out.n_train.to_string());
    kv("Test rows", &out.n_test.to_string());
    kv("Train", &out.train_path.display().to_string());
    kv("Test", &out.test_path.display().to_string());
    println!();
    Ok(())
}

pub fn cmd_transform(config: PipelineConfig, train: &Path, test: &Path) -> anyhow::Result<()> {
    section("Transform");
    let pipeline = TrainingPipeline::new(config)?;

    step_run("Fitting preprocessor");
    let start = Instant::now();
    let out = pipeline.transform(train, test).context("data transformation failed")?;
    step_done(&format!("{:?}", start.elapsed()));

    kv("Train array", &format!("{} × {}", out.train_array.nrows(), out.train_array.ncols()));
    kv("Test array", &format!("{} × {}", out.test_array.nrows(), out.test_array.ncols()));
    kv("Preprocessor", &out.preprocessor_path.display().to_string());
    println!();
    Ok(())
}

fn train_and_report(pipeline: &TrainingPipeline, train: &Path, test: &Path) -> anyhow::Result<()> {
    step_run("Training candidates");
    let start = Instant::now();
    let out = match pipeline.run(train, test) {
        Ok(out) => out,
        Err(e @ GradecastError::QualityGate { .. }) => {
            println!("{}", "failed".yellow());
            println!("  {}", e.to_string().yellow());
            return Err(e).context("no model saved");
        }
        Err(e) => return Err(e).context("training failed"),
    };
    step_done(&format!("{:?}", start.elapsed()));

    print_report(&out.summary.report, &out.summary.best_model);
    kv("Best model", &out.summary.best_model.cyan().to_string());
    kv("Test R²", &format!("{:.4}", out.summary.test_r2));
    kv("Test RMSE", &format!("{:.4}", out.summary.metrics.rmse));
    kv("Test MAE", &format!("{:.4}", out.summary.metrics.mae));
    kv("Features", &out.n_features.to_string());
    kv("Model", &out.summary.model_path.display().to_string());
    kv("Preprocessor", &out.preprocessor_path.display().to_string());
    println!();
    Ok(())
}

pub fn cmd_train(config: PipelineConfig, train: &Path, test: &Path) -> anyhow::Result<()> {
    section("Train");
    let pipeline = TrainingPipeline::new(config)?;
    train_and_report(&pipeline, train, test)
}

pub fn cmd_run(config: PipelineConfig, data: &Path) -> anyhow::Result<()> {
    section("Run");
    let pipeline = TrainingPipeline::new(config)?;

    step_run("Splitting data");
    let ingested = pipeline
        .ingest(data)
        .with_context(|| format!("ingesting {}", data.display()))?;
    step_done(&format!("{} train / {} test rows", ingested.n_train, ingested.n_test));

    train_and_report(&pipeline, &ingested.train_path, &ingested.test_path)
}

pub fn cmd_inspect(path: &Path) -> anyhow::Result<()> {
    section("Inspect");
    kv("File", &path.display().to_string());

    if let Ok(artifact) = ModelArtifact::load(path) {
        kv("Kind", "model");
        kv("Name", &artifact.name);
        kv("Algorithm", artifact.model.kind());
        kv("Test R²", &format!("{:.4}", artifact.test_r2));
        kv("Features", &artifact.n_features.to_string());
        kv("Created", &artifact.created_at.to_rfc3339());
        println!();
        return Ok(());
    }

    let preprocessor = DataPreprocessor::load(path)
        .with_context(|| format!("{} is neither a model nor a preprocessor", path.display()))?;
    kv("Kind", "preprocessor");
    kv("Rows fitted", &preprocessor.samples_fitted().to_string());
    kv("Numerical", &preprocessor.numeric_columns().join(", "));
    kv("Categorical", &preprocessor.categorical_columns().join(", "));
    kv("Output width", &preprocessor.n_features_out().to_string());
    println!();
    for stats in preprocessor.feature_stats() {
        println!(
            "  {:<32} {}",
            muted(&stats.name),
            dim(&format!("{:?}, {} missing of {}", stats.dtype, stats.null_count, stats.count))
        );
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_train() {
        let cli = Cli::try_parse_from([
            "gradecast", "--artifacts-dir", "out", "train", "--train", "a.csv", "--test", "b.csv",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Train { .. }));
        let config = cli.pipeline_config().unwrap();
        assert_eq!(config.artifacts_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_global_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["gradecast", "run", "--data", "raw.csv", "--artifacts-dir", "x"]).unwrap();
        assert_eq!(cli.artifacts_dir, Some(PathBuf::from("x")));
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["gradecast"]).is_err());
    }
}
