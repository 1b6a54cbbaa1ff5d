//! HTTP service exposing trainable models.
//!
//! Routes come from [`RoutePlugin`](mlservice_routes::RoutePlugin)s imported into a
//! [`RouteRegistry`](mlservice_routes::RouteRegistry) and applied onto a
//! [`ServingTable`](mlservice_routes::ServingTable); see [`app::build_app`].

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod plugins;

pub use app::{build_app, model_factory, ServiceApp};
pub use config::ServiceConfig;
pub use error::{ApiError, ApiResult};
