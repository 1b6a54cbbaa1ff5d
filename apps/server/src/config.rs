//! Service configuration.
//!
//! Layered from built-in defaults, an optional TOML file and `MLSERVICE__*`
//! environment variables (e.g. `MLSERVICE__SERVER__ADDRESS=127.0.0.1:9000`).

use mlservice_routes::RouteSource;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Namespace every bundled external route plugin lives under.
pub const EXTERNAL_ROUTES_NAMESPACE: &str = "external_routes";

const ENV_PREFIX: &str = "MLSERVICE";

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: SocketAddr,
}

fn default_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: default_address() }
    }
}

/// Route sources imported at startup, in order.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RoutesConfig {
    #[serde(default = "default_sources")]
    pub sources: Vec<RouteSource>,
}

fn default_sources() -> Vec<RouteSource> {
    vec![RouteSource::Namespace(EXTERNAL_ROUTES_NAMESPACE.to_string())]
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self { sources: default_sources() }
    }
}

/// Artifact-store configuration. Without a root, `ML_HOME` is read when a model
/// is first persisted.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ArtifactsConfig {
    #[serde(default)]
    pub root: Option<PathBuf>,
}

/// Root configuration for the service.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
}

impl ServiceConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration, reading `file` when given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or any source fails to deserialize.
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file).required(true));
        }
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));

        let config: Self = builder.build()?.try_deserialize()?;
        tracing::debug!(
            address = %config.server.address,
            sources = config.routes.sources.len(),
            artifact_root = ?config.artifacts.root,
            "Loaded service configuration"
        );
        Ok(config)
    }

    /// Override the listener host and/or port.
    pub fn override_address(&mut self, host: Option<std::net::IpAddr>, port: Option<u16>) {
        if let Some(host) = host {
            self.server.address.set_ip(host);
        }
        if let Some(port) = port {
            self.server.address.set_port(port);
        }
    }
}
