//! gradecast - Main Entry Point
//!
//! Batch training pipeline for exam-score regression.

use clap::Parser;
use gradecast::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gradecast=info".into()),
        )
        .init();

    run(Cli::parse())
}
