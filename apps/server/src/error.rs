//! HTTP mapping of model lifecycle failures.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mlservice_training::TrainingError;
use serde_json::json;
use thiserror::Error;

/// Errors returned by model endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Training(#[from] TrainingError),

    /// A blocking model task panicked or was cancelled.
    #[error("model task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Training(err) => match err {
                TrainingError::ModelNotFitted(_) => StatusCode::CONFLICT,
                TrainingError::SourceNotFound(_) => StatusCode::NOT_FOUND,
                TrainingError::Dataset(_) | TrainingError::UnknownModelKind(_) => StatusCode::BAD_REQUEST,
                TrainingError::CorruptArtifact { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Training(err) => match err {
                TrainingError::Configuration(_) => "configuration",
                TrainingError::SourceNotFound(_) => "source_not_found",
                TrainingError::ModelNotFitted(_) => "model_not_fitted",
                TrainingError::CorruptArtifact { .. } => "corrupt_artifact",
                TrainingError::Dataset(_) => "dataset",
                TrainingError::Model(_) => "model",
                TrainingError::UnknownModelKind(_) => "unknown_model_kind",
                TrainingError::Io(_) | TrainingError::Json(_) | TrainingError::Csv(_) => "internal",
            },
            Self::Task(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind(), "Model endpoint failed");
        } else {
            tracing::debug!(error = %self, kind = self.kind(), "Model endpoint rejected request");
        }
        (status, Json(json!({ "error": self.kind(), "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_status_per_kind() {
        let cases = [
            (TrainingError::ModelNotFitted("m".to_string()), StatusCode::CONFLICT),
            (TrainingError::SourceNotFound(PathBuf::from("x.csv")), StatusCode::NOT_FOUND),
            (TrainingError::Dataset("bad".to_string()), StatusCode::BAD_REQUEST),
            (TrainingError::UnknownModelKind("k".to_string()), StatusCode::BAD_REQUEST),
            (TrainingError::Configuration("ML_HOME".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}
