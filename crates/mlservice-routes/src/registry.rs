//! The route registry: collects route entries and applies them to a serving table.

use crate::entry::{normalize_path, Binder, HttpMethod, RouteEntry, RouteOptions};
use crate::error::{RegistryError, Result};
use crate::plugin::{ImportReport, PluginCatalog, RouteSource};
use crate::table::{BindOutcome, Origin, ServingTable};
use axum::handler::Handler;
use axum::routing::on;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static CLAIMED: AtomicBool = AtomicBool::new(false);
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Counts from one [`RouteRegistry::apply`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Newly bound (path, method) pairs.
    pub bound: usize,
    /// Pairs this registry had bound on the table by an earlier apply.
    pub already_bound: usize,
    /// Pairs skipped because another binding already owns the key.
    pub skipped_duplicates: usize,
}

/// The application's table of route entries.
///
/// Exactly one registry is claimed per process (see [`RouteRegistry::claim`]); the
/// composition root owns it and passes it to every route plugin.
pub struct RouteRegistry {
    id: u64,
    entries: Vec<RouteEntry>,
    imported: HashSet<String>,
}

impl std::fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRegistry")
            .field("entries", &self.entries.len())
            .field("imported", &self.imported)
            .finish_non_exhaustive()
    }
}

impl RouteRegistry {
    /// Claim the process-wide registry.
    ///
    /// The first call succeeds; every later call fails with
    /// [`RegistryError::SingletonViolation`].
    pub fn claim() -> Result<Self> {
        CLAIMED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| RegistryError::SingletonViolation)?;
        tracing::debug!("Route registry claimed");
        Ok(Self::create())
    }

    /// A registry that does not count against the process-wide claim.
    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn unclaimed() -> Self {
        Self::create()
    }

    fn create() -> Self {
        Self { id: NEXT_ID.fetch_add(1, Ordering::Relaxed), entries: Vec::new(), imported: HashSet::new() }
    }

    /// Register `handler` for `path` under every verb in `methods` and return it
    /// unchanged. An empty verb set registers `GET`.
    pub fn route<H, T>(
        &mut self,
        path: &str,
        methods: impl IntoIterator<Item = HttpMethod>,
        handler: H,
        options: RouteOptions,
    ) -> H
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        let mut methods: BTreeSet<HttpMethod> = methods.into_iter().collect();
        if methods.is_empty() {
            methods.insert(HttpMethod::Get);
        }
        let path = normalize_path(path);

        let stored = handler.clone();
        let binder: Binder = Arc::new(move |filter| on(filter, stored.clone()));

        tracing::debug!(
            path = %path,
            methods = ?methods,
            "Registered route"
        );
        self.entries.push(RouteEntry::new(path, methods, options, binder));
        handler
    }

    pub fn get<H, T>(&mut self, path: &str, handler: H) -> H
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        self.route(path, [HttpMethod::Get], handler, RouteOptions::default())
    }

    pub fn post<H, T>(&mut self, path: &str, handler: H) -> H
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        self.route(path, [HttpMethod::Post], handler, RouteOptions::default())
    }

    pub fn put<H, T>(&mut self, path: &str, handler: H) -> H
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        self.route(path, [HttpMethod::Put], handler, RouteOptions::default())
    }

    pub fn delete<H, T>(&mut self, path: &str, handler: H) -> H
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        self.route(path, [HttpMethod::Delete], handler, RouteOptions::default())
    }

    pub fn get_with<H, T>(&mut self, path: &str, handler: H, options: RouteOptions) -> H
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        self.route(path, [HttpMethod::Get], handler, options)
    }

    pub fn post_with<H, T>(&mut self, path: &str, handler: H, options: RouteOptions) -> H
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        self.route(path, [HttpMethod::Post], handler, options)
    }

    pub fn put_with<H, T>(&mut self, path: &str, handler: H, options: RouteOptions) -> H
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        self.route(path, [HttpMethod::Put], handler, options)
    }

    pub fn delete_with<H, T>(&mut self, path: &str, handler: H, options: RouteOptions) -> H
    where
        H: Handler<T, ()> + Sync,
        T: 'static,
    {
        self.route(path, [HttpMethod::Delete], handler, options)
    }

    /// Registered entries in registration order.
    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plugin names already imported into this registry.
    #[must_use]
    pub fn imported_plugins(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.imported.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run the registration entry point of every plugin `source` resolves to.
    ///
    /// A plugin is registered at most once per registry, however many sources
    /// name it and however often this is called. A missing directory source is
    /// fatal; an unresolvable namespace or unknown plugin name is only a warning.
    pub fn import_from(&mut self, source: &RouteSource, catalog: &PluginCatalog) -> Result<ImportReport> {
        let resolution = catalog.resolve(source)?;
        let mut report = ImportReport {
            source: source.to_string(),
            registered: Vec::new(),
            already_imported: Vec::new(),
            warnings: resolution.warnings,
        };

        for warning in &report.warnings {
            tracing::warn!(source = %source, warning = %warning, "Route source import warning");
        }

        for plugin in resolution.plugins {
            let name = plugin.name().to_string();
            if self.imported.contains(&name) {
                tracing::debug!(plugin = %name, "Plugin already imported");
                report.already_imported.push(name);
                continue;
            }

            let before = self.entries.len();
            plugin.register(self);
            self.imported.insert(name.clone());
            tracing::info!(
                plugin = %name,
                source = %source,
                routes = self.entries.len() - before,
                "Imported route plugin"
            );
            report.registered.push(name);
        }

        Ok(report)
    }

    /// Bind every entry onto `table`.
    ///
    /// Keys this registry bound before are left alone, so repeated applies only
    /// add what was registered since. A key owned by anything else is skipped
    /// with a warning: the first binding wins.
    pub fn apply(&self, table: &mut ServingTable) -> ApplyReport {
        let mut report = ApplyReport::default();

        for (index, entry) in self.entries.iter().enumerate() {
            let origin = Origin::Entry { registry: self.id, index };
            for &method in entry.methods() {
                match table.insert(entry.path(), method, entry.bind(method), entry.options().clone(), origin) {
                    BindOutcome::Bound => report.bound += 1,
                    BindOutcome::AlreadyBound => report.already_bound += 1,
                    BindOutcome::Conflict => {
                        tracing::warn!(
                            path = %entry.path(),
                            method = %method,
                            "Duplicate route skipped; first binding wins"
                        );
                        report.skipped_duplicates += 1;
                    }
                }
            }
        }

        tracing::info!(
            bound = report.bound,
            already_bound = report.already_bound,
            skipped = report.skipped_duplicates,
            total = table.len(),
            "Applied route registry"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    async fn hello() -> &'static str {
        "hello"
    }

    async fn bye() -> &'static str {
        "bye"
    }

    async fn call(table: &ServingTable, method: &str, uri: &str) -> (StatusCode, String) {
        let response = table
            .router()
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn test_claim_is_exclusive() {
        let first = RouteRegistry::claim();
        assert!(first.is_ok());
        assert!(matches!(RouteRegistry::claim(), Err(RegistryError::SingletonViolation)));
    }

    #[tokio::test]
    async fn test_route_returns_handler_and_defaults_to_get() {
        let mut registry = RouteRegistry::unclaimed();
        let returned = registry.route("/hello", [], hello, RouteOptions::default());
        assert_eq!(returned().await, "hello");

        let entry = &registry.entries()[0];
        assert_eq!(entry.path(), "/hello");
        assert_eq!(entry.methods().iter().copied().collect::<Vec<_>>(), vec![HttpMethod::Get]);
    }

    #[test]
    fn test_registration_order_preserved() {
        let mut registry = RouteRegistry::unclaimed();
        registry.get("/b", hello);
        registry.post("/a", hello);
        registry.put_with("/items/{id}", hello, RouteOptions::new().tag("items"));

        let paths: Vec<&str> = registry.entries().iter().map(RouteEntry::path).collect();
        assert_eq!(paths, vec!["/b", "/a", "/items/:id"]);
        assert_eq!(registry.entries()[2].options().tags, vec!["items"]);
    }

    #[tokio::test]
    async fn test_apply_binds_every_method() {
        let mut registry = RouteRegistry::unclaimed();
        registry.route("/hello", [HttpMethod::Get, HttpMethod::Post], hello, RouteOptions::default());

        let mut table = ServingTable::new();
        let report = registry.apply(&mut table);
        assert_eq!(report.bound, 2);
        assert!(table.contains("/hello", HttpMethod::Get));
        assert!(table.contains("/hello", HttpMethod::Post));

        assert_eq!(call(&table, "GET", "/hello").await, (StatusCode::OK, "hello".to_string()));
        assert_eq!(call(&table, "POST", "/hello").await, (StatusCode::OK, "hello".to_string()));
        assert_eq!(call(&table, "DELETE", "/hello").await.0, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_apply_twice_is_idempotent_and_adds_delta() {
        let mut registry = RouteRegistry::unclaimed();
        registry.get("/one", hello);

        let mut table = ServingTable::new();
        assert_eq!(registry.apply(&mut table).bound, 1);

        let again = registry.apply(&mut table);
        assert_eq!(again, ApplyReport { bound: 0, already_bound: 1, skipped_duplicates: 0 });
        assert_eq!(table.len(), 1);

        registry.get("/two", bye);
        let delta = registry.apply(&mut table);
        assert_eq!(delta, ApplyReport { bound: 1, already_bound: 1, skipped_duplicates: 0 });
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_first_binding_wins() {
        let mut registry = RouteRegistry::unclaimed();
        registry.get("/greet", hello);
        registry.get("/greet", bye);
        registry.get("/items/:id", hello);
        registry.get("/items/{other}", bye);

        let mut table = ServingTable::new();
        let report = registry.apply(&mut table);
        assert_eq!(report.bound, 2);
        assert_eq!(report.skipped_duplicates, 2);
        assert_eq!(call(&table, "GET", "/greet").await.1, "hello");
        assert_eq!(call(&table, "GET", "/items/7").await.1, "hello");
    }

    #[tokio::test]
    async fn test_overlapping_wildcard_is_skipped() {
        let mut registry = RouteRegistry::unclaimed();
        registry.get("/files/{id}", hello);
        registry.get("/files/{*rest}", bye);
        registry.get("/files/{id}/meta", hello);

        let mut table = ServingTable::new();
        let report = registry.apply(&mut table);
        assert_eq!(report.bound, 2);
        assert_eq!(report.skipped_duplicates, 1);
        assert!(!table.contains("/files/{*rest}", HttpMethod::Get));
        assert_eq!(call(&table, "GET", "/files/7").await.1, "hello");
        assert_eq!(call(&table, "GET", "/files/7/meta").await.1, "hello");
    }

    #[test]
    fn test_direct_binding_takes_precedence() {
        let mut table = ServingTable::new();
        assert!(table.bind("/", HttpMethod::Get, hello, RouteOptions::default()));

        let mut registry = RouteRegistry::unclaimed();
        registry.get("/", bye);
        let report = registry.apply(&mut table);
        assert_eq!(report.skipped_duplicates, 1);
        assert!(!table.bind("/", HttpMethod::Get, bye, RouteOptions::default()));
    }

    #[test]
    fn test_fresh_table_binds_everything() {
        let mut registry = RouteRegistry::unclaimed();
        registry.get("/one", hello);
        registry.get("/two", bye);

        let mut first = ServingTable::new();
        registry.apply(&mut first);
        let mut second = ServingTable::new();
        assert_eq!(registry.apply(&mut second).bound, 2);
    }
}
