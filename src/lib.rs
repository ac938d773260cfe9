//! # Exemplar - mock responses for unfinished HTTP endpoints
//!
//! Exemplar lets an axum service answer requests before its handlers are
//! written. A handler that signals "not implemented" gets a JSON example
//! instead of an error, synthesized from the route's declared examples or
//! from its response schema.
//!
//! ## Features
//!
//! - **Example providers**: ordered registry of generators keyed by type
//! - **Schema resolution**: records, enums, lists, tuples, sets, maps, unions
//! - **Dispatch middleware**: `X-Mock-Response: 1` on every synthesized body
//! - **JSON Schema import**: descriptors from OpenAPI / `schemars` schemas
//! - **Configured providers**: constants, faker data, patterns, rhai scripts
//! - **Metrics**: Prometheus counters for substitutions and fallbacks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use axum::{routing::get, Json, Router};
//! use exemplar::adapters::mock_middleware::{MockUtilities, NotImplemented};
//! use exemplar::adapters::route_table::MockRoute;
//! use exemplar::domain::{FieldSchema, RecordSchema, TypeDescriptor};
//! use serde_json::Value;
//!
//! async fn greet() -> Result<Json<Value>, NotImplemented> {
//!     Err(NotImplemented)
//! }
//!
//! let message: TypeDescriptor = RecordSchema::new("Message")
//!     .field(FieldSchema::new("message", TypeDescriptor::str()).example("Hello World!"))
//!     .into();
//!
//! let app: Router = MockUtilities::new([MockRoute::get("/greet").response(message)])
//!     .attach(Router::new().route("/greet", get(greet)));
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: type descriptors, record schemas, errors, JSON Schema import
//! - **Adapters**: provider registry, resolver, route table, middleware, metrics
//! - **Config**: settings file, route and provider definitions, validation

pub mod adapters;
pub mod config;
pub mod domain;

use crate::adapters::metrics_handler::{MetricsHandler, MockMetrics};
use crate::adapters::mock_middleware::{MockUtilities, NotImplemented};
use crate::config::Settings;
use axum::{
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Path reserved for the Prometheus endpoint.
pub const METRICS_PATH: &str = "/metrics";

/// Creates a router serving every configured route from examples only.
///
/// Configured routes are matched by the route table inside a single fallback
/// that answers [`NotImplemented`], so all of their responses come from the
/// mock layer; anything else is a 404. `/metrics` exposes the substitution
/// counters.
pub fn create_app(settings: &Settings) -> Result<Router, anyhow::Error> {
    let metrics = Arc::new(MockMetrics::new()?);
    let routes = settings.route_table()?;
    for route in routes.iter() {
        tracing::info!(method = %route.method, path = %route.path, "Mock route registered");
    }

    let table = Arc::new(routes.clone());
    let router = Router::new().fallback(move |method: Method, uri: Uri| {
        let table = table.clone();
        async move {
            if table.find(&method, uri.path()).is_some() {
                NotImplemented.into_response()
            } else {
                StatusCode::NOT_FOUND.into_response()
            }
        }
    });

    let mock = MockUtilities::new(routes.iter().cloned())
        .with_example_provider(settings.example_provider()?)
        .return_example_instead_of_500(settings.mock.return_example_instead_of_500)
        .with_metrics(metrics.clone());

    let metrics_handler = Arc::new(MetricsHandler::new(metrics));
    let router = mock.attach(router).route(
        METRICS_PATH,
        get(move || {
            let handler = metrics_handler.clone();
            async move { handler.metrics().await }
        }),
    );

    Ok(router.layer(CorsLayer::permissive()))
}
