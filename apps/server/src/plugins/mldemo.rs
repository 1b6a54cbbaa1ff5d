//! Demo model endpoints backed by a model that learns nothing.

use crate::models::{register_model_endpoints, ModelEndpoint, ModelHub};
use mlservice_routes::{RoutePlugin, RouteRegistry};
use mlservice_training::{Dataset, Metrics, Model, ModelFactory, Params, Prediction, TrainingResult};
use serde_json::json;
use std::sync::Arc;

pub const DUMMY_PLUGIN: &str = "external_routes.mldemo.dummy";
pub const DUMMY_DECORATOR_PLUGIN: &str = "external_routes.mldemo.dummy_decorator";

/// Accepts any data, predicts a fixed message and always scores accuracy 1.0.
#[derive(Debug, Clone, Default)]
pub struct DummyModel {
    params: Params,
}

impl DummyModel {
    pub const KIND: &'static str = "dummy";

    #[must_use]
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl Model for DummyModel {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn fit(&mut self, _train: &Dataset, _eval: Option<&Dataset>) -> TrainingResult<()> {
        Ok(())
    }

    fn infer(&self, _data: &Dataset) -> TrainingResult<Prediction> {
        Ok(Prediction::Value(json!({ "message": "Dummy model prediction" })))
    }

    fn score(&self, _data: &Dataset) -> TrainingResult<Metrics> {
        Ok(Metrics::from([("accuracy".to_string(), Some(1.0))]))
    }
}

/// Add the dummy kind to `factory`.
pub fn register_kinds(factory: &mut ModelFactory) {
    factory.register(DummyModel::KIND, |params| Ok(Box::new(DummyModel::new(params.clone()))));
}

/// Serves a [`DummyModel`] under `/{endpoint}/...`.
#[derive(Debug, Clone)]
pub struct DummyEndpoints {
    plugin: &'static str,
    endpoint: &'static str,
    hub: Arc<ModelHub>,
}

impl DummyEndpoints {
    /// `/dummy/...`
    #[must_use]
    pub fn dummy(hub: Arc<ModelHub>) -> Self {
        Self { plugin: DUMMY_PLUGIN, endpoint: "dummy", hub }
    }

    /// `/dummy_decorator/...`
    #[must_use]
    pub fn dummy_decorator(hub: Arc<ModelHub>) -> Self {
        Self { plugin: DUMMY_DECORATOR_PLUGIN, endpoint: "dummy_decorator", hub }
    }
}

impl RoutePlugin for DummyEndpoints {
    fn name(&self) -> &str {
        self.plugin
    }

    fn register(&self, registry: &mut RouteRegistry) {
        register_model_endpoints(registry, &self.hub, ModelEndpoint::new(self.endpoint, DummyModel::KIND));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_model_hooks() {
        let mut model = DummyModel::default();
        let data = Dataset::Reference("anything.bin".to_string());
        model.fit(&data, None).unwrap();
        assert_eq!(model.infer(&data).unwrap(), Prediction::Value(json!({ "message": "Dummy model prediction" })));
        assert_eq!(model.score(&data).unwrap()["accuracy"], Some(1.0));
    }

    #[test]
    fn test_register_kinds() {
        let mut factory = ModelFactory::new();
        register_kinds(&mut factory);
        assert_eq!(factory.create("dummy", &Params::new()).unwrap().kind(), "dummy");
    }
}
