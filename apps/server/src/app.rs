//! Application assembly: plugins into the registry, the registry onto the serving table.

use crate::config::ServiceConfig;
use crate::logging::RequestLoggerLayer;
use crate::models::ModelHub;
use crate::plugins::{self, BUILTIN_NAMESPACE};
use anyhow::Context;
use axum::{Json, Router};
use mlservice_routes::{
    ApplyReport, Binding, HttpMethod, ImportReport, RouteOptions, RouteRegistry, RouteSource, ServingTable,
};
use mlservice_training::{ArtifactStore, ModelFactory};
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};

/// The assembled service and what went into it.
#[derive(Debug)]
pub struct ServiceApp {
    pub router: Router,
    /// One report per imported source, built-ins first.
    pub imports: Vec<ImportReport>,
    pub applied: ApplyReport,
}

/// Model kinds the service can construct.
#[must_use]
pub fn model_factory() -> ModelFactory {
    let mut factory = ModelFactory::with_builtins();
    plugins::mldemo::register_kinds(&mut factory);
    factory
}

async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

/// Import built-in and configured route sources into `registry` and build the router.
///
/// # Errors
///
/// Fails when a configured source cannot be imported, e.g. a missing directory
/// or an unparseable manifest.
pub fn build_app(registry: &mut RouteRegistry, config: &ServiceConfig) -> anyhow::Result<ServiceApp> {
    let store = config.artifacts.root.clone().map(ArtifactStore::new);
    let hub = Arc::new(ModelHub::new(model_factory(), store));
    let catalog = plugins::catalog(&hub);

    let builtin = RouteSource::Namespace(BUILTIN_NAMESPACE.to_string());
    let mut imports = Vec::with_capacity(config.routes.sources.len() + 1);
    for source in std::iter::once(&builtin).chain(&config.routes.sources) {
        let report = registry
            .import_from(source, &catalog)
            .with_context(|| format!("failed to import routes from {source}"))?;
        imports.push(report);
    }

    let mut table = ServingTable::new();
    table.bind("/", HttpMethod::Get, welcome, RouteOptions::new().summary("Welcome message"));

    let index: Arc<OnceLock<Vec<Binding>>> = Arc::new(OnceLock::new());
    let listing = Arc::clone(&index);
    table.bind(
        "/routes",
        HttpMethod::Get,
        move || {
            let listing = Arc::clone(&listing);
            async move { Json(listing.get().cloned().unwrap_or_default()) }
        },
        RouteOptions::new().summary("Every bound route with its options"),
    );

    let applied = registry.apply(&mut table);
    // Set once, before the router can serve a request.
    let _ = index.set(table.routes().cloned().collect());

    tracing::info!(
        routes = table.len(),
        plugins = registry.imported_plugins().len(),
        "Service routes assembled"
    );

    Ok(ServiceApp { router: table.into_router().layer(RequestLoggerLayer), imports, applied })
}
