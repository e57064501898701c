//! Artifact persistence
//!
//! - Transactional staging and commit of JSON artifacts
//! - The persisted model artifact with its metadata

mod artifacts;
mod model_artifact;

pub use artifacts::{load_json, ArtifactStore};
pub use model_artifact::ModelArtifact;
