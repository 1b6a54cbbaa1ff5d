//! Sample of a route unit living outside the core service.

use axum::Json;
use mlservice_routes::{RouteOptions, RoutePlugin, RouteRegistry};
use serde::Serialize;
use std::collections::BTreeMap;

pub const PLUGIN_NAME: &str = "external_routes.external_sample";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalDataResponse {
    pub source: String,
    pub data: BTreeMap<String, String>,
}

pub async fn external_endpoint() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Hello from external route!" }))
}

pub async fn external_data() -> Json<ExternalDataResponse> {
    Json(ExternalDataResponse {
        source: "external module".to_string(),
        data: BTreeMap::from([
            ("key".to_string(), "value".to_string()),
            ("status".to_string(), "active".to_string()),
        ]),
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalSample;

impl RoutePlugin for ExternalSample {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn register(&self, registry: &mut RouteRegistry) {
        registry.get_with("/external", external_endpoint, RouteOptions::new().tag("external"));
        registry.get_with(
            "/external/data",
            external_data,
            RouteOptions::new().tag("external").summary("Example data endpoint"),
        );
    }
}
