//! CSV loading and saving

use crate::error::{GradecastError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// CSV reader with header detection and full-file schema inference
#[derive(Debug, Clone, Default)]
pub struct DataLoader;

impl DataLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| GradecastError::DataError(format!("{}: {}", path.display(), e)))?;

        // scan every row so a late float does not break an integer-typed column
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| GradecastError::DataError(format!("{}: {}", path.display(), e)))?;

        debug!(path = %path.display(), rows = df.height(), cols = df.width(), "Loaded CSV");
        Ok(df)
    }
}

/// Save DataFrames to disk
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV with a header row, creating parent directories
    pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)
            .map_err(|e| GradecastError::DataError(format!("{}: {}", path.display(), e)))?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .map_err(|e| GradecastError::DataError(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.csv");

        let mut df = df!(
            "gender" => &["female", "male"],
            "math_score" => &[72.0, 69.0],
        )
        .unwrap();
        DataSaver::save_csv(&mut df, &path).unwrap();

        let loaded = DataLoader::new().load_csv(&path).unwrap();
        assert_eq!(loaded.shape(), (2, 2));
        assert!(loaded.equals(&df));
    }

    #[test]
    fn test_empty_cells_load_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gaps.csv");
        std::fs::write(&path, "reading_score,lunch\n70,standard\n,free/reduced\n80,\n").unwrap();

        let df = DataLoader::new().load_csv(&path).unwrap();
        assert_eq!(df.column("reading_score").unwrap().null_count(), 1);
        assert_eq!(df.column("lunch").unwrap().null_count(), 1);
    }

    #[test]
    fn test_missing_file() {
        let result = DataLoader::new().load_csv("/definitely/not/here.csv");
        assert!(matches!(result, Err(GradecastError::DataError(_))));
    }
}
