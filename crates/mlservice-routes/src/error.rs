//! Error types for route registration and route-source import.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the route registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A second registry was requested in the same process.
    #[error("route registry already claimed; pass the existing registry instead of claiming a new one")]
    SingletonViolation,

    /// A directory route source does not exist.
    #[error("route source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// A plugin manifest could not be parsed.
    #[error("invalid plugin manifest {}: {source}", path.display())]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("route source scan failed: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
