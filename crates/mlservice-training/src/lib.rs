//! mlservice training
//!
//! Model lifecycle primitives for:
//! - Loading datasets by file extension (`load_data`)
//! - The model capability set (`Model`) and kind-based construction (`ModelFactory`)
//! - Train / predict / evaluate with versioned persistence (`ManagedModel`, `load_model`)
//! - Tabular estimators and evaluators (`tabular`)

pub mod artifacts;
pub mod dataset;
pub mod error;
pub mod layout;
pub mod lifecycle;
pub mod loader;
pub mod model;
pub mod registry;
pub mod tabular;

pub use artifacts::{Metrics, ModelArtifact, Partition, TrainingReport, ARTIFACT_FORMAT_VERSION};
pub use dataset::{Cell, Column, Dataset, Table};
pub use error::{TrainingError, TrainingResult};
pub use layout::{ArtifactStore, ARTIFACT_ROOT_ENV, METADATA_FILE, MODEL_FILE, PARAMS_FILE};
pub use lifecycle::{load_model, ManagedModel};
pub use loader::load_data;
pub use model::{Model, ModelConstructor, ModelFactory, Params, Prediction};
pub use registry::{discover_versions, ModelVersionEntry};
