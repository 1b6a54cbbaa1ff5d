use crate::artifacts::{read_artifact, TrainingReport};
use crate::error::TrainingResult;
use crate::layout::{ArtifactStore, METADATA_FILE, MODEL_FILE};
use std::path::PathBuf;
use walkdir::WalkDir;

/// A persisted model version found on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVersionEntry {
    /// The version directory (pass to [`crate::load_model`]).
    pub path: PathBuf,
    /// The metadata record written when the version was trained.
    pub metadata: TrainingReport,
}

/// Discover every persisted version of `name`, newest first.
///
/// A version directory is any directory under `<root>/models/<name>` holding both
/// `metadata.json` and `model.json`. Directories with unreadable metadata are
/// skipped with a warning.
pub fn discover_versions(store: &ArtifactStore, name: &str) -> TrainingResult<Vec<ModelVersionEntry>> {
    let model_dir = store.model_dir(name);
    let mut out = Vec::new();
    if !model_dir.is_dir() {
        return Ok(out);
    }

    for entry in WalkDir::new(&model_dir).min_depth(1).follow_links(false) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_name() != METADATA_FILE || !entry.file_type().is_file() {
            continue;
        }
        let Some(dir) = entry.path().parent() else { continue };
        if !dir.join(MODEL_FILE).is_file() {
            continue;
        }

        match read_artifact::<TrainingReport>(entry.path()) {
            Ok(metadata) => out.push(ModelVersionEntry { path: dir.to_path_buf(), metadata }),
            Err(err) => {
                tracing::warn!(path = %entry.path().display(), error = %err, "Skipping unreadable model metadata");
            }
        }
    }

    out.sort_by(|a, b| b.metadata.timestamp.cmp(&a.metadata.timestamp).then_with(|| b.path.cmp(&a.path)));
    Ok(out)
}

impl ArtifactStore {
    /// Persisted versions of `name`, newest first.
    pub fn list_versions(&self, name: &str) -> TrainingResult<Vec<ModelVersionEntry>> {
        discover_versions(self, name)
    }

    /// The most recently trained version of `name`, if any.
    pub fn latest_version(&self, name: &str) -> TrainingResult<Option<ModelVersionEntry>> {
        Ok(discover_versions(self, name)?.into_iter().next())
    }
}
