use crate::error::{TrainingError, TrainingResult};
use chrono::{Datelike, NaiveDate, Utc};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Environment variable naming the artifact-store root.
pub const ARTIFACT_ROOT_ENV: &str = "ML_HOME";

pub const MODEL_FILE: &str = "model.json";
pub const PARAMS_FILE: &str = "params.json";
pub const METADATA_FILE: &str = "metadata.json";

/// Filesystem layout for persisted model versions.
///
/// Versions live under `<root>/models/<name>/<version>/<YYYY>/<MM>/<DD>/<uuid>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a store rooted at `$ML_HOME`.
    pub fn from_env() -> TrainingResult<Self> {
        Self::from_env_var(ARTIFACT_ROOT_ENV)
    }

    pub fn from_env_var(var: &str) -> TrainingResult<Self> {
        match std::env::var(var) {
            Ok(root) if !root.trim().is_empty() => Ok(Self::new(root)),
            _ => Err(TrainingError::Configuration(format!("{var} environment variable not set"))),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn model_dir(&self, name: &str) -> PathBuf {
        self.root.join("models").join(name)
    }

    #[must_use]
    pub fn version_dir(&self, name: &str, version: &str, date: NaiveDate, id: Uuid) -> PathBuf {
        self.model_dir(name)
            .join(version)
            .join(date.year().to_string())
            .join(format!("{:02}", date.month()))
            .join(format!("{:02}", date.day()))
            .join(id.to_string())
    }

    /// Create a fresh, never-before-used version directory.
    ///
    /// The random leaf keeps concurrent allocations apart; the leaf itself is
    /// created with `create_dir` so an existing directory is never reused.
    pub fn allocate(&self, name: &str, version: &str) -> TrainingResult<PathBuf> {
        let dir = self.version_dir(name, version, Utc::now().date_naive(), Uuid::new_v4());
        if let Some(parent) = dir.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir(&dir)?;

        tracing::debug!(model = name, version, path = %dir.display(), "Allocated model version directory");
        Ok(dir)
    }
}
