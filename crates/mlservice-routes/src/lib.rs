//! mlservice routes
//!
//! Assembles the HTTP surface from independently written route plugins:
//! - `RouteRegistry` collects route entries through explicit builder calls
//! - `PluginCatalog` / `RouteSource` decide which plugins register
//! - `ServingTable` is the serving-layer router entries are applied into

pub mod entry;
pub mod error;
pub mod plugin;
pub mod registry;
pub mod table;

pub use entry::{normalize_path, HttpMethod, RouteEntry, RouteOptions};
pub use error::{RegistryError, Result};
pub use plugin::{ImportReport, PluginCatalog, RoutePlugin, RouteSource, SourceImportWarning};
pub use registry::{ApplyReport, RouteRegistry};
pub use table::{Binding, ServingTable};
