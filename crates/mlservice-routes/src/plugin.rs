//! Route plugins and route-source discovery.
//!
//! Route-defining units never run as a side effect of file discovery. Each unit
//! implements [`RoutePlugin`] and is listed in a [`PluginCatalog`] at build time;
//! a [`RouteSource`] only decides *which* catalog entries to register.

use crate::error::{RegistryError, Result};
use crate::registry::RouteRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// A unit that contributes routes through one registration entry point.
pub trait RoutePlugin: Send + Sync {
    /// Dotted name, e.g. `external_routes.mldemo.dummy`.
    fn name(&self) -> &str;

    /// Register this unit's routes.
    fn register(&self, registry: &mut RouteRegistry);
}

/// Where to discover route plugins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    /// Recursively scanned for `*.toml` plugin manifests.
    Directory(PathBuf),
    /// Every catalog plugin at or beneath this dotted prefix.
    Namespace(String),
}

impl fmt::Display for RouteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(path) => write!(f, "directory:{}", path.display()),
            Self::Namespace(name) => write!(f, "namespace:{name}"),
        }
    }
}

/// A recoverable problem met while resolving a route source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceImportWarning {
    /// No catalog plugin lives under the namespace.
    NamespaceNotFound { namespace: String },
    /// A manifest names a plugin the catalog does not know.
    UnknownPlugin { manifest: PathBuf, plugin: String },
}

impl fmt::Display for SourceImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamespaceNotFound { namespace } => {
                write!(f, "namespace {namespace} could not be resolved; its routes are skipped")
            }
            Self::UnknownPlugin { manifest, plugin } => {
                write!(f, "manifest {} names unknown plugin {plugin}", manifest.display())
            }
        }
    }
}

/// Outcome of [`RouteRegistry::import_from`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub source: String,
    /// Plugins whose entry point ran during this call.
    pub registered: Vec<String>,
    /// Plugins skipped because an earlier import already registered them.
    pub already_imported: Vec<String>,
    pub warnings: Vec<SourceImportWarning>,
}

/// Plugins a source resolved to, in registration order.
pub(crate) struct Resolution {
    pub(crate) plugins: Vec<Arc<dyn RoutePlugin>>,
    pub(crate) warnings: Vec<SourceImportWarning>,
}

/// Plugin manifest found in a directory source.
///
/// ```toml
/// enabled = true
/// plugins = ["external_routes.external_sample"]
/// ```
#[derive(Debug, Clone, Deserialize)]
struct PluginManifest {
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    plugins: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn is_private(name: &str) -> bool {
    name.starts_with('_')
}

/// Build-time list of every route plugin the application ships.
#[derive(Default, Clone)]
pub struct PluginCatalog {
    plugins: BTreeMap<String, Arc<dyn RoutePlugin>>,
}

impl fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginCatalog").field("plugins", &self.names()).finish()
    }
}

impl PluginCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin. A later plugin with the same name replaces the earlier one.
    pub fn add(&mut self, plugin: impl RoutePlugin + 'static) -> &mut Self {
        let name = plugin.name().to_string();
        if self.plugins.insert(name.clone(), Arc::new(plugin)).is_some() {
            tracing::warn!(plugin = %name, "Replaced route plugin with the same name");
        }
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn RoutePlugin>> {
        self.plugins.get(name).cloned()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub(crate) fn resolve(&self, source: &RouteSource) -> Result<Resolution> {
        match source {
            RouteSource::Namespace(prefix) => Ok(self.resolve_namespace(prefix)),
            RouteSource::Directory(dir) => self.resolve_directory(dir),
        }
    }

    fn resolve_namespace(&self, prefix: &str) -> Resolution {
        let nested = format!("{prefix}.");
        let plugins: Vec<Arc<dyn RoutePlugin>> = self
            .plugins
            .iter()
            .filter(|(name, _)| name.as_str() == prefix || name.starts_with(&nested))
            .filter(|(name, _)| !name.split('.').any(is_private))
            .map(|(_, plugin)| Arc::clone(plugin))
            .collect();

        let warnings = if plugins.is_empty() {
            vec![SourceImportWarning::NamespaceNotFound { namespace: prefix.to_string() }]
        } else {
            Vec::new()
        };
        Resolution { plugins, warnings }
    }

    fn resolve_directory(&self, dir: &Path) -> Result<Resolution> {
        if !dir.is_dir() {
            return Err(RegistryError::SourceNotFound(dir.to_path_buf()));
        }

        let mut resolution = Resolution { plugins: Vec::new(), warnings: Vec::new() };
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_str().is_some_and(is_private));

        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }

            let contents = std::fs::read_to_string(path)?;
            let manifest: PluginManifest = toml::from_str(&contents)
                .map_err(|source| RegistryError::InvalidManifest { path: path.to_path_buf(), source })?;
            if !manifest.enabled {
                tracing::debug!(manifest = %path.display(), "Skipping disabled plugin manifest");
                continue;
            }

            for name in manifest.plugins {
                match self.get(&name) {
                    Some(plugin) => resolution.plugins.push(plugin),
                    None => resolution
                        .warnings
                        .push(SourceImportWarning::UnknownPlugin { manifest: path.to_path_buf(), plugin: name }),
                }
            }
        }

        Ok(resolution)
    }
}
