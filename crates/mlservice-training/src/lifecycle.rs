use crate::artifacts::{
    read_artifact, write_json, Metrics, ModelArtifact, Partition, TrainingReport, ARTIFACT_FORMAT_VERSION,
};
use crate::error::{TrainingError, TrainingResult};
use crate::layout::{ArtifactStore, ARTIFACT_ROOT_ENV, METADATA_FILE, MODEL_FILE, PARAMS_FILE};
use crate::loader::load_data;
use crate::model::{Model, ModelFactory, Params, Prediction};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;

/// A model wrapped in the train / predict / evaluate / persist contract.
///
/// The wrapped [`Model`] only supplies the three hooks. Data loading, the fitted
/// flag, version directories and artifact files are handled here.
pub struct ManagedModel {
    name: String,
    version: String,
    params: Params,
    fitted: bool,
    model: Box<dyn Model>,
    store: Option<ArtifactStore>,
    /// Variable read for the artifact root when no store is pinned.
    store_env: String,
}

impl std::fmt::Debug for ManagedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedModel")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("kind", &self.model.kind())
            .field("fitted", &self.fitted)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ManagedModel {
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>, params: Params, model: Box<dyn Model>) -> Self {
        Self { name: name.into(), version: version.into(), params, fitted: false, model, store: None, store_env: ARTIFACT_ROOT_ENV.to_string() }
    }

    /// Construct an unfitted model of the given kind.
    pub fn from_factory(
        factory: &ModelFactory,
        kind: &str,
        name: impl Into<String>,
        version: impl Into<String>,
        params: Params,
    ) -> TrainingResult<Self> {
        let model = factory.create(kind, &params)?;
        Ok(Self::new(name, version, params, model))
    }

    /// Persist into `store` instead of the `ML_HOME` root.
    #[must_use]
    pub fn with_store(mut self, store: ArtifactStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Read the artifact root from `var` instead of `ML_HOME` when no store is pinned.
    #[must_use]
    pub fn with_store_env(mut self, var: impl Into<String>) -> Self {
        self.store_env = var.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        self.model.kind()
    }

    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    #[must_use]
    pub fn model(&self) -> &dyn Model {
        self.model.as_ref()
    }

    fn resolve_store(&self) -> TrainingResult<ArtifactStore> {
        self.store.clone().map_or_else(|| ArtifactStore::from_env_var(&self.store_env), Ok)
    }

    fn ensure_fitted(&self) -> TrainingResult<()> {
        if self.fitted { Ok(()) } else { Err(TrainingError::ModelNotFitted(self.name.clone())) }
    }

    /// Train, score every supplied partition and persist a new version.
    ///
    /// Absent eval/test sources are skipped. Every call allocates a fresh version
    /// directory, so repeated training never overwrites an earlier artifact.
    pub fn train(
        &mut self,
        train_path: &str,
        eval_path: Option<&str>,
        test_path: Option<&str>,
    ) -> TrainingResult<TrainingReport> {
        // Fail on a missing artifact root before spending time on fitting.
        let store = self.resolve_store()?;
        let timestamp = Utc::now();

        let train = load_data(Some(train_path))?
            .ok_or_else(|| TrainingError::SourceNotFound(train_path.into()))?;
        let eval = load_data(eval_path)?;
        let test = load_data(test_path)?;

        tracing::info!(model = %self.name, version = %self.version, kind = self.model.kind(), train_path, "Training model");

        self.fitted = false;
        self.model.fit(&train, eval.as_ref())?;
        self.fitted = true;

        let mut metrics: BTreeMap<String, Metrics> = BTreeMap::new();
        for (partition, data) in
            [(Partition::Train, Some(&train)), (Partition::Validation, eval.as_ref()), (Partition::Test, test.as_ref())]
        {
            if let Some(data) = data {
                metrics.insert(partition.as_str().to_string(), self.model.score(data)?);
            }
        }

        let dir = store.allocate(&self.name, &self.version)?;
        self.save(&dir)?;

        let report = TrainingReport {
            timestamp,
            train_path: train_path.to_string(),
            eval_path: eval_path.map(ToString::to_string),
            test_path: test_path.map(ToString::to_string),
            model_path: dir.clone(),
            metrics,
        };
        write_json(dir.join(METADATA_FILE), &report)?;

        tracing::info!(
            model = %self.name,
            version = %self.version,
            path = %dir.display(),
            partitions = report.metrics.len(),
            "Model trained and persisted"
        );
        Ok(report)
    }

    pub fn predict(&self, data_path: &str) -> TrainingResult<Prediction> {
        self.ensure_fitted()?;
        let data = load_data(Some(data_path))?.ok_or_else(|| TrainingError::SourceNotFound(data_path.into()))?;
        self.model.infer(&data)
    }

    pub fn evaluate(&self, data_path: &str) -> TrainingResult<Metrics> {
        self.ensure_fitted()?;
        let data = load_data(Some(data_path))?.ok_or_else(|| TrainingError::SourceNotFound(data_path.into()))?;
        self.model.score(&data)
    }

    /// Write `model.json` and `params.json` into `dir`, creating it if needed.
    pub fn save(&self, dir: &Path) -> TrainingResult<()> {
        std::fs::create_dir_all(dir)?;
        let artifact = ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            kind: self.model.kind().to_string(),
            name: self.name.clone(),
            version: self.version.clone(),
            fitted: self.fitted,
            params: self.params.clone(),
            state: self.model.state()?,
        };
        write_json(dir.join(MODEL_FILE), &artifact)?;
        write_json(dir.join(PARAMS_FILE), &self.params)?;
        Ok(())
    }
}

/// Reconstruct a persisted model from a version directory.
///
/// Missing directory or `model.json` is [`TrainingError::SourceNotFound`]. Anything
/// that prevents rebuilding a working model (bad JSON, unsupported format, a kind the
/// factory does not know, state the variant rejects) is [`TrainingError::CorruptArtifact`].
pub fn load_model(dir: &Path, factory: &ModelFactory) -> TrainingResult<ManagedModel> {
    if !dir.is_dir() {
        return Err(TrainingError::SourceNotFound(dir.to_path_buf()));
    }
    let path = dir.join(MODEL_FILE);
    if !path.is_file() {
        return Err(TrainingError::SourceNotFound(path));
    }

    let artifact: ModelArtifact = read_artifact(&path)?;
    if artifact.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(TrainingError::corrupt(
            &path,
            format!("unsupported artifact format version {}", artifact.format_version),
        ));
    }

    let mut model = factory.create(&artifact.kind, &artifact.params).map_err(|e| TrainingError::corrupt(&path, e))?;
    model.restore(artifact.state).map_err(|e| TrainingError::corrupt(&path, e))?;
    if artifact.fitted && !model.is_ready() {
        return Err(TrainingError::corrupt(&path, "artifact is marked fitted but carries no learned state"));
    }

    tracing::info!(
        model = %artifact.name,
        version = %artifact.version,
        kind = %artifact.kind,
        path = %dir.display(),
        "Loaded model artifact"
    );

    Ok(ManagedModel {
        name: artifact.name,
        version: artifact.version,
        params: artifact.params,
        fitted: artifact.fitted,
        model,
        store: None,
        store_env: ARTIFACT_ROOT_ENV.to_string(),
    })
}
