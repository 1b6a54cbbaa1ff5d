//! The serving-layer routing table that registries apply into.

use crate::entry::{normalize_path, paths_conflict, HttpMethod, RouteOptions};
use axum::Router;
use axum::handler::Handler;
use axum::routing::{on, MethodRouter};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Where a binding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    /// Bound directly on the table by the composition root.
    Direct,
    /// Bound from entry `index` of registry `registry`.
    Entry { registry: u64, index: usize },
}

/// One (path, method) binding, as listed by [`ServingTable::routes`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub path: String,
    pub method: HttpMethod,
    pub options: RouteOptions,
    #[serde(skip)]
    pub(crate) origin: Origin,
}

/// Outcome of one attempt to bind a route on the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindOutcome {
    Bound,
    /// The same source already bound this key.
    AlreadyBound,
    /// Another source owns this key, or the path overlaps a bound one.
    Conflict,
}

/// Wraps the serving layer's router and remembers every bound `(path, method)`.
///
/// Each key is bound at most once: the first binding wins.
#[derive(Debug, Default)]
pub struct ServingTable {
    router: Router,
    bindings: BTreeMap<(String, HttpMethod), Binding>,
    paths: BTreeSet<String>,
}

impl ServingTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler directly, outside any registry.
    ///
    /// Returns `false` (and binds nothing) when the key is already taken.
    pub fn bind<H, T>(&mut self, path: &str, method: HttpMethod, handler: H, options: RouteOptions) -> bool
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let path = normalize_path(path);
        let outcome = self.insert(&path, method, on(method.filter(), handler), options, Origin::Direct);
        if outcome != BindOutcome::Bound {
            tracing::warn!(path = %path, method = %method, "Route already bound; direct binding skipped");
        }
        outcome == BindOutcome::Bound
    }

    pub(crate) fn insert(
        &mut self,
        path: &str,
        method: HttpMethod,
        method_router: MethodRouter,
        options: RouteOptions,
        origin: Origin,
    ) -> BindOutcome {
        let key = (path.to_string(), method);
        if let Some(existing) = self.bindings.get(&key) {
            return if existing.origin == origin { BindOutcome::AlreadyBound } else { BindOutcome::Conflict };
        }
        if self.paths.iter().any(|known| paths_conflict(known, path)) {
            return BindOutcome::Conflict;
        }

        self.router = std::mem::take(&mut self.router).route(path, method_router);
        self.paths.insert(path.to_string());
        self.bindings.insert(key, Binding { path: path.to_string(), method, options, origin });
        BindOutcome::Bound
    }

    #[must_use]
    pub fn contains(&self, path: &str, method: HttpMethod) -> bool {
        self.bindings.contains_key(&(normalize_path(path), method))
    }

    /// Every binding, ordered by path then method.
    pub fn routes(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// A clone of the assembled router.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }
}
