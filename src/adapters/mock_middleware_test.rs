use super::example_provider::{ExampleProvider, Generator};
use super::metrics_handler::MockMetrics;
use super::mock_middleware::{MockException, MockUtilities, NotImplemented, MOCK_HEADER};
use super::route_table::MockRoute;
use super::script_provider::ScriptProvider;
use crate::domain::{FieldSchema, RecordSchema, TypeDescriptor, TypeKey};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

async fn not_implemented() -> Result<Json<Value>, NotImplemented> {
    Err(NotImplemented)
}

async fn implemented() -> Json<Value> {
    Json(json!({ "real": true }))
}

async fn failing() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}

async fn panics_unimplemented() -> Json<Value> {
    unimplemented!()
}

async fn panics_todo() -> Json<Value> {
    todo!()
}

fn message_record() -> TypeDescriptor {
    RecordSchema::new("Message")
        .field(FieldSchema::new("message", TypeDescriptor::str()).example("Hello World!"))
        .into()
}

async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Option<String>, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let header = response
        .headers()
        .get(MOCK_HEADER)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, header, body)
}

#[tokio::test]
async fn test_route_example_replaces_not_implemented() {
    let app = MockUtilities::new([MockRoute::get("/mock-endpoint")
        .openapi_extra(&json!({ "examples": [{ "message": "A" }] }))])
    .attach(Router::new().route("/mock-endpoint", get(not_implemented)));

    let (status, header, body) = call(app, "GET", "/mock-endpoint").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(header.as_deref(), Some("1"));
    assert_eq!(body, json!({ "message": "A" }));
}

#[tokio::test]
async fn test_response_schema_is_resolved() {
    let app = MockUtilities::new([MockRoute::get("/message").response(message_record())])
        .attach(Router::new().route("/message", get(not_implemented)));

    let (status, header, body) = call(app, "GET", "/message").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(header.as_deref(), Some("1"));
    assert_eq!(body, json!({ "message": "Hello World!" }));
}

#[tokio::test]
async fn test_route_status_is_used() {
    let app = MockUtilities::new([MockRoute::post("/items")
        .status(StatusCode::CREATED)
        .example(json!({ "id": 1 }))])
    .attach(Router::new().route("/items", post(not_implemented)));

    let (status, _, body) = call(app, "POST", "/items").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "id": 1 }));
}

#[tokio::test]
async fn test_no_example_keeps_original_error() {
    let app = MockUtilities::new([MockRoute::get("/bare")])
        .attach(Router::new().route("/bare", get(not_implemented)));

    let (status, header, _) = call(app, "GET", "/bare").await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(header, None);
}

#[tokio::test]
async fn test_unknown_route_keeps_original_error() {
    let app = MockUtilities::new(Vec::<MockRoute>::new())
        .attach(Router::new().route("/other", get(not_implemented)));

    let (status, header, _) = call(app, "GET", "/other").await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(header, None);
}

#[tokio::test]
async fn test_unsupported_schema_keeps_original_error() {
    let blob = MockRoute::get("/blob").response(TypeDescriptor::Opaque("bytes".into()));
    let app = MockUtilities::new([blob])
        .attach(Router::new().route("/blob", get(not_implemented)));

    let (status, header, _) = call(app, "GET", "/blob").await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(header, None);
}

#[tokio::test]
async fn test_implemented_handler_untouched() {
    let app = MockUtilities::new([MockRoute::get("/real").example(json!("mock"))])
        .attach(Router::new().route("/real", get(implemented)));

    let (status, header, body) = call(app, "GET", "/real").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(header, None);
    assert_eq!(body, json!({ "real": true }));
}

#[tokio::test]
async fn test_unimplemented_panics_are_signals() {
    let app = MockUtilities::new([
        MockRoute::get("/panics").example(json!("from-unimplemented")),
        MockRoute::get("/todo").example(json!("from-todo")),
    ])
    .attach(
        Router::new()
            .route("/panics", get(panics_unimplemented))
            .route("/todo", get(panics_todo)),
    );

    let (status, header, body) = call(app.clone(), "GET", "/panics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(header.as_deref(), Some("1"));
    assert_eq!(body, json!("from-unimplemented"));

    let (_, _, body) = call(app, "GET", "/todo").await;
    assert_eq!(body, json!("from-todo"));
}

#[tokio::test]
async fn test_server_errors_only_mocked_when_enabled() {
    let routes = || [MockRoute::get("/fails").example(json!({ "ok": true }))];
    let router = || Router::new().route("/fails", get(failing));

    let app = MockUtilities::new(routes()).attach(router());
    let (status, header, _) = call(app, "GET", "/fails").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header, None);

    let app = MockUtilities::new(routes())
        .return_example_instead_of_500(true)
        .attach(router());
    let (status, header, body) = call(app, "GET", "/fails").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(header.as_deref(), Some("1"));
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn test_mock_exception_resolves_its_descriptor() {
    async fn explicit() -> Result<Json<Value>, MockException> {
        Err(MockException::of::<Vec<bool>>().status(StatusCode::ACCEPTED))
    }

    let app = MockUtilities::new(Vec::<MockRoute>::new())
        .attach(Router::new().route("/explicit", get(explicit)));

    let (status, header, body) = call(app, "GET", "/explicit").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(header.as_deref(), Some("1"));
    assert!(body.as_array().unwrap()[0].is_boolean());
}

#[tokio::test]
async fn test_unresolvable_mock_exception_is_501() {
    async fn explicit() -> Result<Json<Value>, MockException> {
        Err(MockException::new(TypeDescriptor::named("Decimal")))
    }

    let app = MockUtilities::new(Vec::<MockRoute>::new())
        .attach(Router::new().route("/explicit", get(explicit)));

    let (status, header, body) = call(app, "GET", "/explicit").await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(header, None);
    assert_eq!(body["detail"], json!("Mocked response, see docs for more info"));
}

fn two_argument_script_provider() -> ExampleProvider {
    let key = TypeKey::Named("slug".to_string());
    let script = ScriptProvider::compile(&key, "fn generate(a, b) { a + b }").unwrap();
    ExampleProvider::with_providers([(key, Generator::Script(Arc::new(script)))]).unwrap()
}

#[tokio::test]
async fn test_mock_exception_provider_failure_is_500() {
    async fn explicit() -> Result<Json<Value>, MockException> {
        Err(MockException::new(TypeDescriptor::named("slug")))
    }

    let metrics = Arc::new(MockMetrics::new().unwrap());
    let app = MockUtilities::new(Vec::<MockRoute>::new())
        .with_example_provider(two_argument_script_provider())
        .with_metrics(metrics.clone())
        .attach(Router::new().route("/explicit", get(explicit)));

    let (status, header, _) = call(app, "GET", "/explicit").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header, None);

    let text = metrics.encode().unwrap();
    assert!(text.contains("exemplar_fallbacks_total{reason=\"provider_arity\"} 1"));
}

#[tokio::test]
async fn test_provider_arity_keeps_original_error() {
    let metrics = Arc::new(MockMetrics::new().unwrap());
    let slug = MockRoute::get("/slug").response(TypeDescriptor::named("slug"));
    let app = MockUtilities::new([slug])
        .with_example_provider(two_argument_script_provider())
        .with_metrics(metrics.clone())
        .attach(Router::new().route("/slug", get(not_implemented)));

    let (status, header, _) = call(app, "GET", "/slug").await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(header, None);

    let text = metrics.encode().unwrap();
    assert!(text.contains("exemplar_fallbacks_total{reason=\"provider_arity\"} 1"));
    assert!(!text.contains("exemplar_substitutions_total{"));
}

#[tokio::test]
async fn test_custom_provider_and_metrics() {
    let metrics = Arc::new(MockMetrics::new().unwrap());
    let provider =
        ExampleProvider::with_providers([(TypeKey::Str, Generator::constant("custom"))]).unwrap();
    let app = MockUtilities::new([
        MockRoute::get("/users/:id/name").response(TypeDescriptor::str()),
    ])
    .with_example_provider(provider)
    .with_metrics(metrics.clone())
    .attach(Router::new().route("/users/:id/name", get(not_implemented)));

    let (status, _, body) = call(app.clone(), "GET", "/users/7/name").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("custom"));

    let text = metrics.encode().unwrap();
    assert!(text.contains("exemplar_substitutions_total{source=\"response_schema\"} 1"));
}

#[test]
fn test_generate_mock_response_directly() {
    let mock = MockUtilities::new([MockRoute::get("/direct").example(json!(1))]);

    let response = mock.generate_mock_response(&Method::GET, "/direct").unwrap();
    let response = response.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[MOCK_HEADER], "1");

    assert!(mock
        .generate_mock_response(&Method::POST, "/direct")
        .unwrap()
        .is_none());
}
