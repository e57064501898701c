//! Utility functions and types

pub mod data_loader;

pub use data_loader::{DataLoader, DataSaver};

use std::time::{Duration, Instant};

/// Wall-clock timer for stage logging
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
