//! Demo routes showing every registration form.

use axum::Json;
use axum::extract::{Path, Query};
use mlservice_routes::{RouteOptions, RoutePlugin, RouteRegistry};
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub const PLUGIN_NAME: &str = "mlservice.demo";

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DetailQuery {
    #[serde(default)]
    pub detail: bool,
}

pub async fn demo_endpoint() -> Json<Value> {
    Json(json!({ "message": "Hello from registered demo endpoint!" }))
}

pub async fn create_item(Json(item): Json<Map<String, Value>>) -> Json<Value> {
    Json(json!({ "message": format!("Created item: {}", Value::Object(item)) }))
}

pub async fn get_item(Path(item_id): Path<i64>, Query(query): Query<DetailQuery>) -> Json<Value> {
    let mut response = json!({ "item_id": item_id });
    if query.detail {
        response["extra"] = json!("Detailed information here");
    }
    Json(response)
}

pub async fn update_item(Path(item_id): Path<i64>, Json(item): Json<Map<String, Value>>) -> Json<Value> {
    Json(json!({ "message": format!("Updated item {item_id}"), "data": item }))
}

pub async fn delete_item(Path(item_id): Path<i64>) -> Json<Value> {
    Json(json!({ "message": format!("Deleted item {item_id}") }))
}

pub async fn group_base() -> Json<Value> {
    Json(json!({ "message": "Group base endpoint" }))
}

pub async fn group_sub() -> Json<Value> {
    Json(json!({ "message": "Group sub endpoint" }))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DemoRoutes;

impl RoutePlugin for DemoRoutes {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn register(&self, registry: &mut RouteRegistry) {
        let tagged = || RouteOptions::new().tag("demo");

        registry.get_with("/demo", demo_endpoint, tagged().summary("Simple demonstration endpoint"));
        registry.post_with("/demo/items", create_item, tagged().summary("Create an item from a JSON body"));
        registry.get_with(
            "/demo/items/{item_id}",
            get_item,
            tagged().summary("Fetch an item").description("`detail=true` adds extra information"),
        );
        registry.put_with("/demo/items/{item_id}", update_item, tagged().summary("Update an item"));
        registry.delete_with("/demo/items/{item_id}", delete_item, tagged().summary("Delete an item"));
        registry.get_with("/demo/group", group_base, tagged().summary("Group base endpoint"));
        registry.get_with("/demo/group/subpath", group_sub, tagged().summary("Group sub endpoint"));
    }
}
