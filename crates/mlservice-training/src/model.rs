use crate::artifacts::Metrics;
use crate::dataset::{Dataset, Table};
use crate::error::{TrainingError, TrainingResult};
use crate::tabular::{LinearRegression, LogisticRegression};
use serde::Serialize;
use std::collections::HashMap;

/// Opaque model configuration (hyperparameters, column roles, ...).
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Output of a prediction hook, returned to callers unmodified.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Prediction {
    Table(Table),
    Value(serde_json::Value),
}

impl Prediction {
    #[must_use]
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(t) => Some(t),
            Self::Value(_) => None,
        }
    }
}

/// The hooks a concrete model supplies. Everything else (data loading, fitted-state
/// tracking, versioning, persistence) is handled by [`crate::ManagedModel`].
pub trait Model: Send + Sync {
    /// Stable variant name used to re-select the implementation on reload.
    fn kind(&self) -> &str;

    /// Training hook. Mutates internal state.
    fn fit(&mut self, train: &Dataset, eval: Option<&Dataset>) -> TrainingResult<()>;

    /// Prediction hook.
    fn infer(&self, data: &Dataset) -> TrainingResult<Prediction>;

    /// Evaluation hook.
    fn score(&self, data: &Dataset) -> TrainingResult<Metrics>;

    /// Learned state to persist. Stateless models keep the default.
    fn state(&self) -> TrainingResult<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }

    /// Repopulate learned state produced by [`Model::state`].
    fn restore(&mut self, _state: serde_json::Value) -> TrainingResult<()> {
        Ok(())
    }

    /// Whether the learned state needed by [`Model::infer`] and [`Model::score`] is present.
    fn is_ready(&self) -> bool {
        true
    }
}

/// Constructor registered for a model kind.
pub type ModelConstructor = fn(&Params) -> TrainingResult<Box<dyn Model>>;

/// Registry of model variants, keyed by kind.
#[derive(Clone, Default)]
pub struct ModelFactory {
    constructors: HashMap<String, ModelConstructor>,
}

impl std::fmt::Debug for ModelFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelFactory").field("kinds", &self.kinds()).finish()
    }
}

impl ModelFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory pre-populated with the tabular variants.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register(LinearRegression::KIND, |params| Ok(Box::new(LinearRegression::new(params.clone()))));
        factory.register(LogisticRegression::KIND, |params| {
            Ok(Box::new(LogisticRegression::new(params.clone())))
        });
        factory
    }

    /// Register a constructor, replacing any earlier one for the same kind.
    pub fn register(&mut self, kind: impl Into<String>, constructor: ModelConstructor) {
        self.constructors.insert(kind.into(), constructor);
    }

    pub fn create(&self, kind: &str, params: &Params) -> TrainingResult<Box<dyn Model>> {
        let constructor = self
            .constructors
            .get(kind)
            .ok_or_else(|| TrainingError::UnknownModelKind(kind.to_string()))?;
        constructor(params)
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}
