use std::path::PathBuf;
use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

#[derive(Debug, Error)]
pub enum TrainingError {
    /// The artifact root is not configured. Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Predict or evaluate was called before a successful train.
    #[error("model not fitted: {0} must be trained before prediction or evaluation")]
    ModelNotFitted(String),

    #[error("corrupt artifact at {}: {source}", path.display())]
    CorruptArtifact {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("unknown model kind: {0}")]
    UnknownModelKind(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl TrainingError {
    pub fn corrupt(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::CorruptArtifact { path: path.into(), source: source.into() }
    }

    /// Whether the error stems from the caller (bad input or wrong call order)
    /// rather than from the environment.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::SourceNotFound(_)
                | Self::ModelNotFitted(_)
                | Self::Dataset(_)
                | Self::UnknownModelKind(_)
                | Self::CorruptArtifact { .. }
        )
    }
}
