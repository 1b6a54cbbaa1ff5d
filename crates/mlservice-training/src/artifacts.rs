use crate::error::{TrainingError, TrainingResult};
use crate::model::Params;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Metric name to value. `None` marks a metric that could not be computed.
pub type Metrics = BTreeMap<String, Option<f64>>;

/// Bumped when the layout of [`ModelArtifact`] changes incompatibly.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Train,
    Validation,
    Test,
}

impl Partition {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Validation => "validation",
            Self::Test => "test",
        }
    }
}

/// Metadata record written next to every trained model version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub timestamp: DateTime<Utc>,
    pub train_path: String,
    pub eval_path: Option<String>,
    pub test_path: Option<String>,
    pub model_path: PathBuf,
    /// Keyed by partition name (`train`, `validation`, `test`).
    pub metrics: BTreeMap<String, Metrics>,
}

/// Self-describing serialized model: enough to re-select the variant and restore it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub kind: String,
    pub name: String,
    pub version: String,
    pub fitted: bool,
    pub params: Params,
    #[serde(default)]
    pub state: serde_json::Value,
}

pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> TrainingResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Read a JSON artifact, reporting parse failures as [`TrainingError::CorruptArtifact`].
pub fn read_artifact<T: DeserializeOwned>(path: &Path) -> TrainingResult<T> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| TrainingError::corrupt(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_report_serializes_absent_paths_as_null() {
        let report = TrainingReport {
            timestamp: Utc::now(),
            train_path: "train.csv".to_string(),
            eval_path: None,
            test_path: None,
            model_path: PathBuf::from("/tmp/m"),
            metrics: BTreeMap::new(),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["eval_path"], serde_json::Value::Null);
        assert_eq!(value["test_path"], serde_json::Value::Null);
        assert!(value["timestamp"].as_str().unwrap().contains('T'));
    }

    #[test]
    fn test_read_artifact_flags_corruption() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("model.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = read_artifact::<ModelArtifact>(&path).unwrap_err();
        assert!(matches!(err, TrainingError::CorruptArtifact { .. }));
    }
}
