//! Route entries and the values attached to them.

use axum::routing::{MethodFilter, MethodRouter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// HTTP verb a route can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// The serving layer's filter for this verb.
    #[must_use]
    pub fn filter(self) -> MethodFilter {
        match self {
            Self::Get => MethodFilter::GET,
            Self::Post => MethodFilter::POST,
            Self::Put => MethodFilter::PUT,
            Self::Patch => MethodFilter::PATCH,
            Self::Delete => MethodFilter::DELETE,
            Self::Head => MethodFilter::HEAD,
            Self::Options => MethodFilter::OPTIONS,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Framework-level route options. The registry stores them untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteOptions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RouteOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Produces the serving-layer binding of the stored handler for one verb.
pub(crate) type Binder = Arc<dyn Fn(MethodFilter) -> MethodRouter + Send + Sync>;

/// One registered endpoint. Immutable once registered.
#[derive(Clone)]
pub struct RouteEntry {
    path: String,
    methods: BTreeSet<HttpMethod>,
    options: RouteOptions,
    binder: Binder,
}

impl std::fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEntry")
            .field("path", &self.path)
            .field("methods", &self.methods)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl RouteEntry {
    pub(crate) fn new(path: String, methods: BTreeSet<HttpMethod>, options: RouteOptions, binder: Binder) -> Self {
        Self { path, methods, options, binder }
    }

    /// Path template in the serving layer's syntax (`:param`).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn methods(&self) -> &BTreeSet<HttpMethod> {
        &self.methods
    }

    #[must_use]
    pub fn options(&self) -> &RouteOptions {
        &self.options
    }

    pub(crate) fn bind(&self, method: HttpMethod) -> MethodRouter {
        (self.binder)(method.filter())
    }
}

/// Rewrite `{param}` / `{*rest}` segments into `:param` / `*rest`.
///
/// Paths already using the colon form pass through unchanged. A missing leading
/// slash is added.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<String> = path
        .trim_start_matches('/')
        .split('/')
        .map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(inner) if inner.starts_with('*') => inner.to_string(),
            Some(inner) => format!(":{inner}"),
            None => segment.to_string(),
        })
        .collect();
    format!("/{}", segments.join("/"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Static,
    Param,
    CatchAll,
}

fn segment_kind(segment: &str) -> Segment {
    match segment.chars().next() {
        Some(':') => Segment::Param,
        Some('*') => Segment::CatchAll,
        _ => Segment::Static,
    }
}

/// Whether two different normalized paths cannot both live in the serving layer.
///
/// Statics may overlap parameters. A parameter must keep one name at a given
/// position, and a catch-all cannot share its position with anything else.
pub(crate) fn paths_conflict(a: &str, b: &str) -> bool {
    if a == b {
        return false;
    }
    for (left, right) in a.split('/').zip(b.split('/')) {
        match (segment_kind(left), segment_kind(right)) {
            (Segment::Static, Segment::Static) | (Segment::Param, Segment::Param) if left == right => {}
            (Segment::CatchAll, _) | (_, Segment::CatchAll) | (Segment::Param, Segment::Param) => return true,
            (Segment::Static, _) | (_, Segment::Static) => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/items/{item_id}"), "/items/:item_id");
        assert_eq!(normalize_path("/items/:item_id"), "/items/:item_id");
        assert_eq!(normalize_path("files/{*rest}"), "/files/*rest");
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_paths_conflict() {
        assert!(paths_conflict("/items/:a", "/items/:b"));
        assert!(paths_conflict("/users/:id", "/users/:user_id/posts"));
        assert!(paths_conflict("/files/:id", "/files/*rest"));
        assert!(paths_conflict("/files/*rest", "/files/list"));
        assert!(!paths_conflict("/items/:a", "/items/list"));
        assert!(!paths_conflict("/items/:id", "/items/:id/detail"));
        assert!(!paths_conflict("/files", "/files/*rest"));
        assert!(!paths_conflict("/demo/group", "/demo/items"));
    }

    #[test]
    fn test_method_serde() {
        assert_eq!(serde_json::to_string(&HttpMethod::Delete).unwrap(), "\"DELETE\"");
        assert_eq!(serde_json::from_str::<HttpMethod>("\"PATCH\"").unwrap(), HttpMethod::Patch);
    }
}
