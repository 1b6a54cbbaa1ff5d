//! End-to-end tests driving the assembled router in-process.

use axum::body::Body;
use axum::Router;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use mlservice_routes::{RouteRegistry, RouteSource};
use mlservice_server::config::ServiceConfig;
use mlservice_server::{build_app, ServiceApp};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

const LINE: &str = "x,target\n1,2\n2,4\n3,6\n";

fn config(root: &Path) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.artifacts.root = Some(root.to_path_buf());
    config
}

fn assemble(config: &ServiceConfig) -> ServiceApp {
    let mut registry = RouteRegistry::unclaimed();
    build_app(&mut registry, config).unwrap()
}

fn write_csv(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_root_and_demo_routes() {
    let root = TempDir::new().unwrap();
    let app = assemble(&config(root.path())).router;

    assert_eq!(get(&app, "/").await, (StatusCode::OK, json!({ "message": "Hello World" })));
    assert_eq!(
        get(&app, "/demo").await,
        (StatusCode::OK, json!({ "message": "Hello from registered demo endpoint!" }))
    );
    assert_eq!(get(&app, "/demo/items/7").await, (StatusCode::OK, json!({ "item_id": 7 })));
    assert_eq!(
        get(&app, "/demo/items/7?detail=true").await,
        (StatusCode::OK, json!({ "item_id": 7, "extra": "Detailed information here" }))
    );
    assert_eq!(get(&app, "/demo/group/subpath").await.1, json!({ "message": "Group sub endpoint" }));

    let request = Request::builder().method("DELETE").uri("/demo/items/3").body(Body::empty()).unwrap();
    assert_eq!(send(&app, request).await.1, json!({ "message": "Deleted item 3" }));

    let request = Request::builder()
        .method("PUT")
        .uri("/demo/items/3")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"name":"widget"}"#))
        .unwrap();
    assert_eq!(
        send(&app, request).await.1,
        json!({ "message": "Updated item 3", "data": { "name": "widget" } })
    );
}

#[tokio::test]
async fn test_external_routes_imported_by_default() {
    let root = TempDir::new().unwrap();
    let app = assemble(&config(root.path()));

    assert_eq!(
        get(&app.router, "/external/data").await,
        (
            StatusCode::OK,
            json!({ "source": "external module", "data": { "key": "value", "status": "active" } })
        )
    );

    let registered: Vec<&str> = app.imports.iter().flat_map(|r| r.registered.iter().map(String::as_str)).collect();
    assert!(registered.contains(&"external_routes.mldemo.dummy"));
    assert!(registered.contains(&"mlservice.demo"));
    assert_eq!(app.applied.skipped_duplicates, 0);
}

#[tokio::test]
async fn test_route_index_lists_bindings() {
    let root = TempDir::new().unwrap();
    let app = assemble(&config(root.path())).router;

    let (status, body) = get(&app, "/routes").await;
    assert_eq!(status, StatusCode::OK);
    let routes = body.as_array().unwrap();
    assert!(routes.iter().any(|r| r["path"] == "/dummy/train" && r["method"] == "POST"));
    assert!(routes.iter().any(|r| r["path"] == "/demo/items/:item_id" && r["method"] == "PUT"));
    assert!(routes.iter().any(|r| r["path"] == "/" && r["method"] == "GET"));
}

#[tokio::test]
async fn test_predict_before_train_conflicts() {
    let root = TempDir::new().unwrap();
    let app = assemble(&config(root.path())).router;

    let (status, body) = post(&app, "/dummy/predict", &json!({ "data_path": "whatever.bin" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "model_not_fitted");
}

#[tokio::test]
async fn test_dummy_train_predict_and_reload() {
    let root = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let train_path = write_csv(data.path(), "train.csv", LINE);
    let app = assemble(&config(root.path())).router;

    let (status, report) = post(&app, "/dummy/train", &json!({ "train_path": train_path })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["metrics"]["train"]["accuracy"], 1.0);
    let model_path = report["model_path"].as_str().unwrap().to_string();
    assert!(Path::new(&model_path).join("model.json").is_file());

    let (status, prediction) = post(&app, "/dummy/predict", &json!({ "data_path": train_path })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prediction, json!({ "message": "Dummy model prediction" }));

    let (_, versions) = get(&app, "/dummy/versions").await;
    assert_eq!(versions.as_array().unwrap().len(), 1);

    // A freshly assembled service starts empty and reloads the latest version.
    let restarted = assemble(&config(root.path())).router;
    let (status, _) = post(&restarted, "/dummy/evaluate", &json!({ "data_path": train_path })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, loaded) = post(&restarted, "/dummy/load", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loaded["kind"], "dummy");
    assert_eq!(loaded["version"], "v1");
    assert_eq!(loaded["model_path"], model_path);

    let (status, metrics) = post(&restarted, "/dummy/evaluate", &json!({ "data_path": train_path })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics, json!({ "accuracy": 1.0 }));
}

#[tokio::test]
async fn test_load_rejects_other_kind() {
    let root = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let train_path = write_csv(data.path(), "train.csv", LINE);
    let app = assemble(&config(root.path())).router;

    let (_, report) = post(&app, "/dummy/train", &json!({ "train_path": train_path })).await;
    let (status, body) =
        post(&app, "/linear_regression/load", &json!({ "model_path": report["model_path"] })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "corrupt_artifact");
}

#[tokio::test]
async fn test_load_without_versions_is_not_found() {
    let root = TempDir::new().unwrap();
    let app = assemble(&config(root.path())).router;

    let (status, body) = post(&app, "/dummy_decorator/load", &json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "source_not_found");
}

#[tokio::test]
async fn test_linear_regression_endpoints() {
    let root = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let train_path = write_csv(data.path(), "train.csv", LINE);
    let test_path = write_csv(data.path(), "test.csv", "x,target\n4,8\n5,10\n");
    let app = assemble(&config(root.path())).router;

    let (status, report) = post(
        &app,
        "/linear_regression/train",
        &json!({ "version": "v2", "train_path": train_path, "test_path": test_path }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(report["metrics"]["test"]["mse"].as_f64().unwrap() < 1e-6);
    assert!(report["model_path"].as_str().unwrap().contains("v2"));

    let (status, prediction) = post(&app, "/linear_regression/predict", &json!({ "data_path": test_path })).await;
    assert_eq!(status, StatusCode::OK);
    let column = prediction["columns"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "prediction")
        .unwrap();
    let values: Vec<f64> = column["values"].as_array().unwrap().iter().map(|v| v.as_f64().unwrap()).collect();
    assert_eq!(values.len(), 2);
    assert!((values[0] - 8.0).abs() < 1e-6);
    assert!((values[1] - 10.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_train_with_missing_data_is_not_found() {
    let root = TempDir::new().unwrap();
    let app = assemble(&config(root.path())).router;

    let (status, body) =
        post(&app, "/linear_regression/train", &json!({ "train_path": "/no/such/train.csv" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "source_not_found");
}

#[test]
fn test_missing_directory_source_is_fatal() {
    let root = TempDir::new().unwrap();
    let mut config = config(root.path());
    config.routes.sources.push(RouteSource::Directory(root.path().join("absent")));

    let mut registry = RouteRegistry::unclaimed();
    let err = build_app(&mut registry, &config).unwrap_err();
    assert!(format!("{err:#}").contains("absent"));
}

#[test]
fn test_unknown_namespace_only_warns() {
    let root = TempDir::new().unwrap();
    let mut config = config(root.path());
    config.routes.sources = vec![RouteSource::Namespace("nowhere".to_string())];

    let app = assemble(&config);
    let report = app.imports.last().unwrap();
    assert!(report.registered.is_empty());
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn test_directory_manifest_imports_plugins() {
    let root = TempDir::new().unwrap();
    let routes = root.path().join("routes");
    std::fs::create_dir_all(routes.join("_disabled")).unwrap();
    std::fs::write(routes.join("sample.toml"), r#"plugins = ["external_routes.external_sample"]"#).unwrap();
    std::fs::write(routes.join("_disabled").join("dummy.toml"), r#"plugins = ["external_routes.mldemo.dummy"]"#)
        .unwrap();

    let mut config = config(root.path());
    config.routes.sources = vec![RouteSource::Directory(routes)];

    let app = assemble(&config);
    let report = app.imports.last().unwrap();
    assert_eq!(report.registered, vec!["external_routes.external_sample".to_string()]);
}
