//! Transactional artifact persistence
//!
//! Artifacts are serialized to `<path>.tmp` when staged and renamed onto
//! their final path only on [`ArtifactStore::commit`]. A store dropped
//! before commit removes its temp files, leaving any previously committed
//! artifact untouched.
//!
//! Each rename is atomic on its own. If one fails partway through a commit,
//! the artifacts renamed before it stay in place and the rest remain staged.

use crate::error::{GradecastError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug)]
struct StagedArtifact {
    target: PathBuf,
    temp: PathBuf,
}

/// Set of artifacts written together or not at all
#[derive(Debug, Default)]
pub struct ArtifactStore {
    staged: Vec<StagedArtifact>,
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize `value` as JSON next to `path`, to be moved there on commit.
    ///
    /// Staging the same path twice replaces the earlier content.
    pub fn stage<T: Serialize>(&mut self, path: impl AsRef<Path>, value: &T) -> Result<PathBuf> {
        let target = path.as_ref().to_path_buf();
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp = temp_path(&target);
        let file = File::create(&temp).map_err(|e| {
            GradecastError::DataError(format!("Failed to create {}: {}", temp.display(), e))
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value).map_err(|e| {
            GradecastError::SerializationError(format!("Failed to serialize {}: {}", target.display(), e))
        })?;
        writer.flush()?;

        if !self.staged.iter().any(|s| s.target == target) {
            self.staged.push(StagedArtifact { target: target.clone(), temp });
        }
        debug!(path = %target.display(), "Staged artifact");
        Ok(target)
    }

    /// Move every staged artifact onto its final path, in staging order.
    ///
    /// An artifact leaves the store only once its rename succeeded, so on
    /// error the remaining temp files are still removed by rollback or drop.
    pub fn commit(&mut self) -> Result<Vec<PathBuf>> {
        let mut committed = Vec::with_capacity(self.staged.len());
        while let Some(staged) = self.staged.first() {
            fs::rename(&staged.temp, &staged.target).map_err(|e| {
                GradecastError::DataError(format!("Failed to commit {}: {}", staged.target.display(), e))
            })?;
            let staged = self.staged.remove(0);
            info!(path = %staged.target.display(), "Committed artifact");
            committed.push(staged.target);
        }
        Ok(committed)
    }

    /// Remove every staged temp file without touching the final paths
    pub fn rollback(&mut self) {
        for staged in self.staged.drain(..) {
            if let Err(e) = fs::remove_file(&staged.temp) {
                warn!(path = %staged.temp.display(), error = %e, "Failed to remove staged artifact");
            } else {
                debug!(path = %staged.target.display(), "Discarded staged artifact");
            }
        }
    }

    /// Final paths of the artifacts waiting for commit
    pub fn staged_paths(&self) -> Vec<&Path> {
        self.staged.iter().map(|s| s.target.as_path()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }
}

impl Drop for ArtifactStore {
    fn drop(&mut self) {
        if !self.staged.is_empty() {
            self.rollback();
        }
    }
}

/// Read a JSON artifact written by [`ArtifactStore`]
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        GradecastError::DataError(format!("Failed to open {}: {}", path.display(), e))
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        GradecastError::SerializationError(format!("Failed to read {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample() -> BTreeMap<String, f64> {
        BTreeMap::from([("a".to_string(), 1.0), ("b".to_string(), 2.5)])
    }

    #[test]
    fn test_commit_moves_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("stats.json");

        let mut store = ArtifactStore::new();
        store.stage(&path, &sample()).unwrap();
        assert!(!path.exists());
        assert!(temp_path(&path).exists());

        let committed = store.commit().unwrap();
        assert_eq!(committed, vec![path.clone()]);
        assert!(!temp_path(&path).exists());

        let loaded: BTreeMap<String, f64> = load_json(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        fs::write(&path, "{\"old\": 0.0}").unwrap();

        {
            let mut store = ArtifactStore::new();
            store.stage(&path, &sample()).unwrap();
        }

        assert!(!temp_path(&path).exists());
        let kept: BTreeMap<String, f64> = load_json(&path).unwrap();
        assert_eq!(kept.get("old"), Some(&0.0));
    }

    #[test]
    fn test_restaging_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value.json");

        let mut store = ArtifactStore::new();
        store.stage(&path, &1u32).unwrap();
        store.stage(&path, &2u32).unwrap();
        assert_eq!(store.staged_paths().len(), 1);

        store.commit().unwrap();
        assert_eq!(load_json::<u32>(&path).unwrap(), 2);
    }

    #[test]
    fn test_failed_rename_keeps_remaining_temp_files_tracked() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.json");
        let blocked = dir.path().join("blocked.json");

        let mut store = ArtifactStore::new();
        store.stage(&first, &1u32).unwrap();
        store.stage(&blocked, &2u32).unwrap();

        // a non-empty directory on the target path makes the rename fail
        fs::create_dir_all(blocked.join("inner")).unwrap();
        assert!(store.commit().is_err());

        assert_eq!(load_json::<u32>(&first).unwrap(), 1);
        assert_eq!(store.staged_paths(), vec![blocked.as_path()]);
        assert!(temp_path(&blocked).exists());

        drop(store);
        assert!(!temp_path(&blocked).exists());
        assert!(blocked.is_dir());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_json::<u32>(dir.path().join("absent.json"));
        assert!(matches!(result, Err(GradecastError::DataError(_))));
    }
}
