//! Model endpoints: train / predict / evaluate / load / versions for a named model.

use crate::error::ApiResult;
use axum::Json;
use mlservice_routes::{RouteOptions, RouteRegistry};
use mlservice_training::{
    load_model, ArtifactStore, ManagedModel, Metrics, ModelFactory, Params, Prediction, TrainingError,
    TrainingReport, TrainingResult,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Version label used when a train request does not name one.
pub const DEFAULT_VERSION: &str = "v1";

/// Trained models shared by every model endpoint, keyed by endpoint name.
pub struct ModelHub {
    factory: ModelFactory,
    store: Option<ArtifactStore>,
    models: RwLock<HashMap<String, Arc<ManagedModel>>>,
}

impl std::fmt::Debug for ModelHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHub")
            .field("factory", &self.factory)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ModelHub {
    /// `store` pins the artifact root; `None` defers to `ML_HOME`.
    #[must_use]
    pub fn new(factory: ModelFactory, store: Option<ArtifactStore>) -> Self {
        Self { factory, store, models: RwLock::new(HashMap::new()) }
    }

    #[must_use]
    pub fn factory(&self) -> &ModelFactory {
        &self.factory
    }

    fn resolve_store(&self) -> TrainingResult<ArtifactStore> {
        self.store.clone().map_or_else(ArtifactStore::from_env, Ok)
    }

    /// The model currently serving `name`, if one was trained or loaded.
    pub async fn get(&self, name: &str) -> Option<Arc<ManagedModel>> {
        self.models.read().await.get(name).cloned()
    }

    async fn fitted(&self, name: &str) -> TrainingResult<Arc<ManagedModel>> {
        self.get(name).await.ok_or_else(|| TrainingError::ModelNotFitted(name.to_string()))
    }

    async fn install(&self, name: &str, model: ManagedModel) -> Arc<ManagedModel> {
        let model = Arc::new(model);
        self.models.write().await.insert(name.to_string(), Arc::clone(&model));
        model
    }
}

/// A named model endpoint set backed by one model kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEndpoint {
    /// URL prefix and artifact name.
    pub name: String,
    /// Factory kind used to construct the model.
    pub kind: String,
}

impl ModelEndpoint {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { name: name.into(), kind: kind.into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainRequest {
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub version: Option<String>,
    pub train_path: String,
    #[serde(default)]
    pub eval_path: Option<String>,
    #[serde(default)]
    pub test_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataRequest {
    pub data_path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadRequest {
    /// Version directory to load; the newest persisted version when absent.
    #[serde(default)]
    pub model_path: Option<PathBuf>,
}

/// Summary of the model now serving an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedModel {
    pub name: String,
    pub version: String,
    pub kind: String,
    pub fitted: bool,
    pub model_path: PathBuf,
}

/// Register the five model routes under `/{endpoint.name}/`.
pub fn register_model_endpoints(registry: &mut RouteRegistry, hub: &Arc<ModelHub>, endpoint: ModelEndpoint) {
    let endpoint = Arc::new(endpoint);
    let prefix = format!("/{}", endpoint.name);
    let options = |summary: String| RouteOptions::new().tag(endpoint.name.clone()).summary(summary);

    let (h, e) = (Arc::clone(hub), Arc::clone(&endpoint));
    registry.post_with(
        &format!("{prefix}/train"),
        move |Json(request): Json<TrainRequest>| train(Arc::clone(&h), Arc::clone(&e), request),
        options(format!("Train a new {} version", endpoint.name)),
    );

    let (h, e) = (Arc::clone(hub), Arc::clone(&endpoint));
    registry.post_with(
        &format!("{prefix}/predict"),
        move |Json(request): Json<DataRequest>| predict(Arc::clone(&h), Arc::clone(&e), request),
        options(format!("Predict with the current {} model", endpoint.name)),
    );

    let (h, e) = (Arc::clone(hub), Arc::clone(&endpoint));
    registry.post_with(
        &format!("{prefix}/evaluate"),
        move |Json(request): Json<DataRequest>| evaluate(Arc::clone(&h), Arc::clone(&e), request),
        options(format!("Evaluate the current {} model", endpoint.name)),
    );

    let (h, e) = (Arc::clone(hub), Arc::clone(&endpoint));
    registry.post_with(
        &format!("{prefix}/load"),
        move |Json(request): Json<LoadRequest>| load(Arc::clone(&h), Arc::clone(&e), request),
        options(format!("Load a persisted {} version", endpoint.name)),
    );

    let (h, e) = (Arc::clone(hub), Arc::clone(&endpoint));
    registry.get_with(
        &format!("{prefix}/versions"),
        move || versions(Arc::clone(&h), Arc::clone(&e)),
        options(format!("List persisted {} versions", endpoint.name)),
    );
}

async fn train(hub: Arc<ModelHub>, endpoint: Arc<ModelEndpoint>, request: TrainRequest) -> ApiResult<Json<TrainingReport>> {
    let TrainRequest { params, version, train_path, eval_path, test_path } = request;
    let version = version.unwrap_or_else(|| DEFAULT_VERSION.to_string());
    let store = hub.resolve_store()?;
    let model = ManagedModel::from_factory(hub.factory(), &endpoint.kind, &endpoint.name, version, params)?
        .with_store(store);

    let (model, report) = tokio::task::spawn_blocking(move || {
        let mut model = model;
        let report = model.train(&train_path, eval_path.as_deref(), test_path.as_deref())?;
        Ok::<_, TrainingError>((model, report))
    })
    .await??;

    hub.install(&endpoint.name, model).await;
    Ok(Json(report))
}

async fn predict(hub: Arc<ModelHub>, endpoint: Arc<ModelEndpoint>, request: DataRequest) -> ApiResult<Json<Prediction>> {
    let model = hub.fitted(&endpoint.name).await?;
    let prediction = tokio::task::spawn_blocking(move || model.predict(&request.data_path)).await??;
    Ok(Json(prediction))
}

async fn evaluate(hub: Arc<ModelHub>, endpoint: Arc<ModelEndpoint>, request: DataRequest) -> ApiResult<Json<Metrics>> {
    let model = hub.fitted(&endpoint.name).await?;
    let metrics = tokio::task::spawn_blocking(move || model.evaluate(&request.data_path)).await??;
    Ok(Json(metrics))
}

async fn load(hub: Arc<ModelHub>, endpoint: Arc<ModelEndpoint>, request: LoadRequest) -> ApiResult<Json<LoadedModel>> {
    let dir = match request.model_path {
        Some(path) => path,
        None => {
            let store = hub.resolve_store()?;
            let name = endpoint.name.clone();
            tokio::task::spawn_blocking(move || store.latest_version(&name))
                .await??
                .map(|entry| entry.path)
                .ok_or_else(|| TrainingError::SourceNotFound(PathBuf::from(&endpoint.name)))?
        }
    };

    let factory = hub.factory().clone();
    let load_dir = dir.clone();
    let model = tokio::task::spawn_blocking(move || load_model(&load_dir, &factory)).await??;
    if model.kind() != endpoint.kind {
        let reason = format!("artifact holds a {} model, endpoint serves {}", model.kind(), endpoint.kind);
        return Err(TrainingError::corrupt(dir, reason).into());
    }

    let loaded = LoadedModel {
        name: model.name().to_string(),
        version: model.version().to_string(),
        kind: model.kind().to_string(),
        fitted: model.is_fitted(),
        model_path: dir,
    };
    hub.install(&endpoint.name, model).await;
    Ok(Json(loaded))
}

async fn versions(hub: Arc<ModelHub>, endpoint: Arc<ModelEndpoint>) -> ApiResult<Json<Vec<TrainingReport>>> {
    let store = hub.resolve_store()?;
    let name = endpoint.name.clone();
    let entries = tokio::task::spawn_blocking(move || store.list_versions(&name)).await??;
    Ok(Json(entries.into_iter().map(|entry| entry.metadata).collect()))
}
