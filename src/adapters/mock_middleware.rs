use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json, Router,
};
use futures::FutureExt;
use serde_json::{json, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::adapters::example_provider::ExampleProvider;
use crate::adapters::metrics_handler::MockMetrics;
use crate::adapters::resolver::SchemaResolver;
use crate::adapters::route_table::{MockRoute, RouteTable};
use crate::domain::{Describe, MockError, TypeDescriptor};

/// Marker header on every synthesized response.
pub const MOCK_HEADER: &str = "x-mock-response";

const MOCK_DETAIL: &str = "Mocked response, see docs for more info";

/// Response extension telling the middleware a handler wants a mock.
#[derive(Debug, Clone)]
pub enum MockSignal {
    NotImplemented,
    ServerError,
    Explicit {
        descriptor: Option<TypeDescriptor>,
        status: StatusCode,
    },
}

/// Handler error for endpoints that have no implementation yet.
///
/// Without the middleware this is a plain 501.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotImplemented;

impl IntoResponse for NotImplemented {
    fn into_response(self) -> Response {
        let mut response = (
            StatusCode::NOT_IMPLEMENTED,
            Json(json!({ "detail": "Not Implemented" })),
        )
            .into_response();
        response.extensions_mut().insert(MockSignal::NotImplemented);
        response
    }
}

/// Handler error asking for an example of a specific descriptor.
#[derive(Debug, Clone)]
pub struct MockException {
    descriptor: Option<TypeDescriptor>,
    status: StatusCode,
}

impl MockException {
    pub fn new(descriptor: TypeDescriptor) -> Self {
        Self {
            descriptor: Some(descriptor),
            status: StatusCode::OK,
        }
    }

    pub fn of<T: Describe>() -> Self {
        Self::new(T::describe())
    }

    /// A mock whose body is `null`.
    pub fn null() -> Self {
        Self {
            descriptor: None,
            status: StatusCode::OK,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl IntoResponse for MockException {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(json!({ "detail": MOCK_DETAIL }))).into_response();
        response.extensions_mut().insert(MockSignal::Explicit {
            descriptor: self.descriptor,
            status: self.status,
        });
        response
    }
}

/// Substitutes example responses for unimplemented or failing handlers.
///
/// ```rust,no_run
/// use axum::{routing::get, Router};
/// use exemplar::adapters::mock_middleware::{MockUtilities, NotImplemented};
/// use exemplar::adapters::route_table::MockRoute;
/// use serde_json::json;
///
/// async fn mock() -> Result<String, NotImplemented> {
///     Err(NotImplemented)
/// }
///
/// let app: Router = MockUtilities::new([MockRoute::get("/mock-endpoint")
///     .openapi_extra(&json!({ "examples": [{ "message": "A" }] }))])
///     .attach(Router::new().route("/mock-endpoint", get(mock)));
/// ```
pub struct MockUtilities {
    routes: RouteTable,
    resolver: SchemaResolver,
    return_example_instead_of_500: bool,
    metrics: Option<Arc<MockMetrics>>,
}

impl MockUtilities {
    pub fn new(routes: impl IntoIterator<Item = MockRoute>) -> Self {
        Self {
            routes: RouteTable::new(routes),
            resolver: SchemaResolver::default(),
            return_example_instead_of_500: false,
            metrics: None,
        }
    }

    pub fn with_example_provider(mut self, provider: ExampleProvider) -> Self {
        self.resolver = SchemaResolver::new(Arc::new(provider));
        self
    }

    /// Also intercept generic 500 responses, not only the not-implemented signal.
    pub fn return_example_instead_of_500(mut self, enabled: bool) -> Self {
        self.return_example_instead_of_500 = enabled;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MockMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Layer the dispatch middleware onto a router.
    pub fn attach<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        info!(
            routes = self.routes.len(),
            return_example_instead_of_500 = self.return_example_instead_of_500,
            "Mock responses enabled"
        );
        router.layer(axum::middleware::from_fn_with_state(
            Arc::new(self),
            mock_middleware,
        ))
    }

    /// Replace a signalling response with a mock, or hand it back unchanged.
    pub fn intercept(&self, method: &Method, path: &str, response: Response) -> Response {
        let signal = match response.extensions().get::<MockSignal>() {
            Some(signal) => signal.clone(),
            None if self.return_example_instead_of_500
                && response.status() == StatusCode::INTERNAL_SERVER_ERROR =>
            {
                MockSignal::ServerError
            }
            None => return response,
        };

        match signal {
            MockSignal::Explicit { descriptor, status } => {
                self.explicit_response(method, path, descriptor.as_ref(), status)
            }
            MockSignal::NotImplemented | MockSignal::ServerError => {
                match self.generate_mock_response(method, path) {
                    Ok(Some(mocked)) => mocked,
                    Ok(None) => response,
                    Err(e) => {
                        error!(%method, path, error = %e, "Error while mocking response");
                        self.record_fallback(e.reason());
                        response
                    }
                }
            }
        }
    }

    /// Build a mock for the route matching `method` and `path`.
    ///
    /// `Ok(None)` means there is nothing to substitute: no matching route,
    /// or a route without a usable example or response schema.
    pub fn generate_mock_response(
        &self,
        method: &Method,
        path: &str,
    ) -> Result<Option<Response>, MockError> {
        let Some(route) = self.routes.find(method, path) else {
            debug!(%method, path, "No mock route matches request");
            self.record_fallback("no_route");
            return Ok(None);
        };

        let mut rng = rand::thread_rng();
        if let Some(example) = route.pick_example(&mut rng) {
            return Ok(Some(self.mocked(route.status, example, "route_example")));
        }

        let Some(descriptor) = &route.response else {
            debug!(%method, path, "Mock route declares no example or response schema");
            self.record_fallback("no_example");
            return Ok(None);
        };

        match self.resolver.resolve_with(Some(descriptor), &mut rng) {
            Ok(example) => Ok(Some(self.mocked(route.status, example, "response_schema"))),
            Err(e) if e.is_unsupported() => {
                warn!(%method, path, error = %e, "Response schema has no example");
                self.record_fallback(e.reason());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn explicit_response(
        &self,
        method: &Method,
        path: &str,
        descriptor: Option<&TypeDescriptor>,
        status: StatusCode,
    ) -> Response {
        match self.resolver.resolve(descriptor) {
            Ok(example) => self.mocked(status, example, "explicit"),
            Err(e) if e.is_unsupported() => {
                self.record_fallback(e.reason());
                (
                    StatusCode::NOT_IMPLEMENTED,
                    Json(json!({ "detail": MOCK_DETAIL })),
                )
                    .into_response()
            }
            Err(e) => {
                error!(%method, path, error = %e, "Error while mocking response");
                self.record_fallback(e.reason());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal Server Error" })),
                )
                    .into_response()
            }
        }
    }

    fn mocked(&self, status: StatusCode, example: Value, source: &str) -> Response {
        if let Some(metrics) = &self.metrics {
            metrics.record_substitution(source);
        }
        let mut response = (status, Json(example)).into_response();
        response
            .headers_mut()
            .insert(MOCK_HEADER, HeaderValue::from_static("1"));
        response
    }

    fn record_fallback(&self, reason: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_fallback(reason);
        }
    }
}

/// Axum middleware driving [`MockUtilities::intercept`].
///
/// Handler panics raised by `unimplemented!()` / `todo!()` count as the
/// not-implemented signal; any other panic becomes a 500.
pub async fn mock_middleware(
    State(mock): State<Arc<MockUtilities>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => panic_response(&method, &path, panic),
    };

    mock.intercept(&method, &path, response)
}

fn panic_response(method: &Method, path: &str, panic: Box<dyn Any + Send>) -> Response {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_default();

    if message.starts_with("not implemented") || message.starts_with("not yet implemented") {
        debug!(%method, path, "Handler is not implemented");
        NotImplemented.into_response()
    } else {
        error!(%method, path, panic = %message, "Handler panicked");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
