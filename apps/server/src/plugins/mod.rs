//! Route plugins shipped with the service.
//!
//! Built-in units live under the `mlservice` namespace and are always imported;
//! the `external_routes` units are imported through the configured route sources.

pub mod demo;
pub mod external_sample;
pub mod mldemo;

use crate::models::{register_model_endpoints, ModelEndpoint, ModelHub};
use mlservice_routes::{PluginCatalog, RoutePlugin, RouteRegistry};
use mlservice_training::tabular::{LinearRegression, LogisticRegression};
use std::sync::Arc;

/// Namespace of the built-in plugins.
pub const BUILTIN_NAMESPACE: &str = "mlservice";

pub const TABULAR_PLUGIN: &str = "mlservice.tabular";

/// Model endpoints for the built-in tabular estimators.
#[derive(Debug, Clone)]
pub struct TabularEndpoints {
    hub: Arc<ModelHub>,
}

impl RoutePlugin for TabularEndpoints {
    fn name(&self) -> &str {
        TABULAR_PLUGIN
    }

    fn register(&self, registry: &mut RouteRegistry) {
        for kind in [LinearRegression::KIND, LogisticRegression::KIND] {
            register_model_endpoints(registry, &self.hub, ModelEndpoint::new(kind, kind));
        }
    }
}

/// Every plugin the service ships, model endpoints bound to `hub`.
#[must_use]
pub fn catalog(hub: &Arc<ModelHub>) -> PluginCatalog {
    let mut catalog = PluginCatalog::new();
    catalog
        .add(demo::DemoRoutes)
        .add(TabularEndpoints { hub: Arc::clone(hub) })
        .add(external_sample::ExternalSample)
        .add(mldemo::DummyEndpoints::dummy(Arc::clone(hub)))
        .add(mldemo::DummyEndpoints::dummy_decorator(Arc::clone(hub)));
    catalog
}
