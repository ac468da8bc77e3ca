// crates/student-registry-server/tests/router.rs
// ============================================================================
// Module: Router Tests
// Description: Endpoint behavior exercised through the axum router.
// Purpose: Pin status codes, bodies, admission control, and API key checks.
// ============================================================================

//! ## Overview
//! Requests are driven with `tower::ServiceExt::oneshot` against a router
//! backed by the in-memory store. The peer address normally supplied by the
//! listener is inserted into request extensions by hand.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use serde_json::Value;
use serde_json::json;
use student_registry_core::AdmissionController;
use student_registry_core::BatchIngestor;
use student_registry_core::InMemoryRecordStore;
use student_registry_core::IngestTransaction;
use student_registry_core::InsertStatement;
use student_registry_core::NewStudent;
use student_registry_core::PageRequest;
use student_registry_core::PlaceholderStyle;
use student_registry_core::RecordStore;
use student_registry_core::SharedRecordStore;
use student_registry_core::StoreError;
use student_registry_core::Student;
use student_registry_core::StudentPatch;
use student_registry_server::AppState;
use student_registry_server::build_router;
use tower::ServiceExt;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const API_KEY: &str = "registry-test-key-0001";

fn state_with(store: &InMemoryRecordStore) -> AppState {
    AppState::new(
        SharedRecordStore::from_store(store.clone()),
        Arc::new(AdmissionController::default()),
        BatchIngestor::new(3),
    )
}

fn app(store: &InMemoryRecordStore) -> Router {
    build_router(state_with(store), 1 << 20)
}

fn peer(last_octet: u8) -> SocketAddr {
    SocketAddr::from(([10, 0, 0, last_octet], 40_000))
}

fn request(method: Method, uri: &str, body: Option<&str>) -> Request<Body> {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(body.map_or_else(Body::empty, |body| Body::from(body.to_string())))
        .unwrap();
    request.extensions_mut().insert(ConnectInfo(peer(1)));
    request
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn seed(store: &InMemoryRecordStore, count: usize) {
    for index in 0 .. count {
        store.insert(&NewStudent::new(format!("student-{index}"), 10, 4)).unwrap();
    }
}

/// Store whose calls block past the request timeout.
#[derive(Default)]
struct DelayedStore {
    inner: InMemoryRecordStore,
    begin_delay: Duration,
    insert_delay: Duration,
    commit_delay: Duration,
}

/// Transaction whose commit blocks before delegating.
struct DelayedTransaction<'a> {
    inner: Box<dyn IngestTransaction + 'a>,
    commit_delay: Duration,
}

impl IngestTransaction for DelayedTransaction<'_> {
    fn insert_returning_ids(
        &mut self,
        statement: &InsertStatement,
    ) -> Result<Vec<i64>, StoreError> {
        self.inner.insert_returning_ids(statement)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        std::thread::sleep(self.commit_delay);
        self.inner.commit()
    }

    fn rollback(&mut self) {
        self.inner.rollback();
    }
}

impl RecordStore for DelayedStore {
    fn placeholder_style(&self) -> PlaceholderStyle {
        self.inner.placeholder_style()
    }

    fn begin(&self) -> Result<Box<dyn IngestTransaction + '_>, StoreError> {
        std::thread::sleep(self.begin_delay);
        let inner = self.inner.begin()?;
        Ok(Box::new(DelayedTransaction {
            inner,
            commit_delay: self.commit_delay,
        }))
    }

    fn insert(&self, student: &NewStudent) -> Result<Student, StoreError> {
        std::thread::sleep(self.insert_delay);
        self.inner.insert(student)
    }

    fn get(&self, id: i64) -> Result<Option<Student>, StoreError> {
        self.inner.get(id)
    }

    fn list(&self, page: PageRequest) -> Result<Vec<Student>, StoreError> {
        self.inner.list(page)
    }

    fn replace(&self, id: i64, student: &NewStudent) -> Result<Option<Student>, StoreError> {
        self.inner.replace(id, student)
    }

    fn patch(&self, id: i64, patch: &StudentPatch) -> Result<Option<Student>, StoreError> {
        self.inner.patch(id, patch)
    }

    fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.inner.delete(id)
    }
}

fn delayed_app(store: DelayedStore) -> Router {
    let state = AppState::new(
        SharedRecordStore::from_store(store),
        Arc::new(AdmissionController::default()),
        BatchIngestor::new(3),
    )
    .with_request_timeout(Duration::from_millis(100));
    build_router(state, 1 << 20)
}

// ============================================================================
// SECTION: Health
// ============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let store = InMemoryRecordStore::new();
    let (status, body) = send(&app(&store), request(Method::GET, "/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

// ============================================================================
// SECTION: Single Record Endpoints
// ============================================================================

#[tokio::test]
async fn create_then_get_round_trips() {
    let store = InMemoryRecordStore::new();
    let app = app(&store);
    let (status, created) = send(
        &app,
        request(Method::POST, "/api/v1/students", Some(r#"{"name":"Alice","age":12,"class":6}"#)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created, json!({"id": 1, "name": "Alice", "age": 12, "class": 6}));

    let (status, fetched) = send(&app, request(Method::GET, "/api/v1/students/1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_rejects_invalid_record_with_field() {
    let store = InMemoryRecordStore::new();
    let (status, body) = send(
        &app(&store),
        request(Method::POST, "/api/v1/students", Some(r#"{"name":"Bob","age":130,"class":2}"#)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation_failure");
    assert_eq!(body["error"]["field"], "age");
    assert_eq!(body["error"]["message"], "age is too high");
    assert!(store.is_empty());
}

#[tokio::test]
async fn create_rejects_malformed_json() {
    let store = InMemoryRecordStore::new();
    let (status, body) =
        send(&app(&store), request(Method::POST, "/api/v1/students", Some("{not json"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "malformed_payload");
    assert!(body["error"].get("field").is_none());
}

#[tokio::test]
async fn unknown_and_invalid_ids() {
    let store = InMemoryRecordStore::new();
    let app = app(&store);
    let (status, body) = send(&app, request(Method::GET, "/api/v1/students/42", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "not_found");

    for uri in ["/api/v1/students/abc", "/api/v1/students/0", "/api/v1/students/-3"] {
        let (status, body) = send(&app, request(Method::GET, uri, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"]["kind"], "malformed_payload");
    }
}

#[tokio::test]
async fn replace_overwrites_every_field() {
    let store = InMemoryRecordStore::new();
    seed(&store, 1);
    let app = app(&store);
    let (status, body) = send(
        &app,
        request(Method::PUT, "/api/v1/students/1", Some(r#"{"name":"Carol","age":15,"class":9}"#)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 1, "name": "Carol", "age": 15, "class": 9}));

    let (status, _) = send(
        &app,
        request(Method::PUT, "/api/v1/students/7", Some(r#"{"name":"Carol","age":15,"class":9}"#)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_updates_only_provided_fields() {
    let store = InMemoryRecordStore::new();
    seed(&store, 1);
    let (status, body) = send(
        &app(&store),
        request(Method::PATCH, "/api/v1/students/1", Some(r#"{"class":5}"#)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 1, "name": "student-0", "age": 10, "class": 5}));
}

#[tokio::test]
async fn patch_rejects_empty_and_zero_values() {
    let store = InMemoryRecordStore::new();
    seed(&store, 1);
    let app = app(&store);
    let (status, body) =
        send(&app, request(Method::PATCH, "/api/v1/students/1", Some("{}"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "no fields to update");

    let (status, body) =
        send(&app, request(Method::PATCH, "/api/v1/students/1", Some(r#"{"class":0}"#))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "class");
    assert_eq!(store.get(1).unwrap().unwrap().class, 4);
}

#[tokio::test]
async fn delete_removes_record_once() {
    let store = InMemoryRecordStore::new();
    seed(&store, 1);
    let app = app(&store);
    let (status, body) = send(&app, request(Method::DELETE, "/api/v1/students/1", None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    let (status, _) = send(&app, request(Method::DELETE, "/api/v1/students/1", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(store.is_empty());
}

// ============================================================================
// SECTION: Listing
// ============================================================================

#[tokio::test]
async fn list_paginates_by_id() {
    let store = InMemoryRecordStore::new();
    seed(&store, 5);
    let app = app(&store);
    let (status, body) =
        send(&app, request(Method::GET, "/api/v1/students?page=2&limit=2", None)).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> =
        body.as_array().unwrap().iter().map(|row| row["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![3, 4]);

    let (_, body) =
        send(&app, request(Method::GET, "/api/v1/students?page=x&limit=-1", None)).await;
    let ids: Vec<i64> =
        body.as_array().unwrap().iter().map(|row| row["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

// ============================================================================
// SECTION: Admission Control
// ============================================================================

#[tokio::test]
async fn list_is_rate_limited_per_client() {
    let store = InMemoryRecordStore::new();
    let app = app(&store);
    for _ in 0 .. 5 {
        let (status, _) = send(&app, request(Method::GET, "/api/v1/students", None)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send(&app, request(Method::GET, "/api/v1/students", None)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["kind"], "rate_limited");

    let mut other = request(Method::GET, "/api/v1/students", None);
    other.extensions_mut().insert(ConnectInfo(peer(2)));
    let (status, _) = send(&app, other).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn writes_are_not_rate_limited() {
    let store = InMemoryRecordStore::new();
    let app = app(&store);
    for index in 0 .. 8 {
        let body = format!(r#"{{"name":"s{index}","age":9,"class":3}}"#);
        let (status, _) =
            send(&app, request(Method::POST, "/api/v1/students", Some(&body))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    assert_eq!(store.len(), 8);
}

#[tokio::test]
async fn list_without_peer_address_is_server_error() {
    let store = InMemoryRecordStore::new();
    let request = Request::builder().uri("/api/v1/students").body(Body::empty()).unwrap();
    let (status, body) = send(&app(&store), request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["kind"], "client_identity");
    assert_eq!(body["error"]["message"], "internal server error");
}

// ============================================================================
// SECTION: Bulk Ingestion
// ============================================================================

#[tokio::test]
async fn bulk_inserts_in_payload_order() {
    let store = InMemoryRecordStore::new();
    let payload = json!([
        {"name": "a", "age": 7, "class": 1},
        {"name": "b", "age": 8, "class": 2},
        {"name": "c", "age": 9, "class": 3},
        {"name": "d", "age": 10, "class": 4},
    ])
    .to_string();
    let (status, body) =
        send(&app(&store), request(Method::POST, "/api/v1/students/bulk", Some(&payload))).await;
    assert_eq!(status, StatusCode::CREATED);
    let names: Vec<&str> =
        body.as_array().unwrap().iter().map(|row| row["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["a", "b", "c", "d"]);
    let ids: Vec<i64> =
        body.as_array().unwrap().iter().map(|row| row["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(store.len(), 4);
}

#[tokio::test]
async fn bulk_accepts_single_object() {
    let store = InMemoryRecordStore::new();
    let (status, body) = send(
        &app(&store),
        request(Method::POST, "/api/v1/students/bulk", Some(r#"{"name":"Alice","age":12,"class":6}"#)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!([{"id": 1, "name": "Alice", "age": 12, "class": 6}]));
}

#[tokio::test]
async fn bulk_with_invalid_record_persists_nothing() {
    let store = InMemoryRecordStore::new();
    let payload = json!([
        {"name": "a", "age": 7, "class": 1},
        {"name": "b", "age": 8, "class": 2},
        {"name": "c", "age": 9, "class": 3},
        {"name": "", "age": 10, "class": 4},
    ])
    .to_string();
    let (status, body) =
        send(&app(&store), request(Method::POST, "/api/v1/students/bulk", Some(&payload))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation_failure");
    assert_eq!(body["error"]["field"], "name");
    assert_eq!(body["error"]["message"], "student at index 3: name is required");
    assert!(store.is_empty());
}

#[tokio::test]
async fn bulk_rejects_malformed_payload() {
    let store = InMemoryRecordStore::new();
    let app = app(&store);
    for payload in ["[1, 2]", "\"text\"", "[{\"name\": 5}"] {
        let (status, body) =
            send(&app, request(Method::POST, "/api/v1/students/bulk", Some(payload))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(body["error"]["kind"], "malformed_payload");
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let store = InMemoryRecordStore::new();
    let app = build_router(state_with(&store), 64);
    let payload = json!([{"name": "x".repeat(128), "age": 9, "class": 3}]).to_string();
    let response = app
        .oneshot(request(Method::POST, "/api/v1/students/bulk", Some(&payload)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(store.is_empty());
}

// ============================================================================
// SECTION: Request Timeout
// ============================================================================

#[tokio::test]
async fn bulk_commit_outlasting_timeout_reports_created() {
    let inner = InMemoryRecordStore::new();
    let store = DelayedStore {
        inner: inner.clone(),
        commit_delay: Duration::from_millis(400),
        ..DelayedStore::default()
    };
    let payload = r#"[{"name":"a","age":7,"class":1},{"name":"b","age":8,"class":2}]"#;
    let (status, body) =
        send(&delayed_app(store), request(Method::POST, "/api/v1/students/bulk", Some(payload)))
            .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.as_array().map(Vec::len), Some(2));
    assert_eq!(inner.len(), 2);
}

#[tokio::test]
async fn bulk_timed_out_before_insert_rolls_back() {
    let inner = InMemoryRecordStore::new();
    let store = DelayedStore {
        inner: inner.clone(),
        begin_delay: Duration::from_millis(300),
        ..DelayedStore::default()
    };
    let payload = r#"[{"name":"a","age":7,"class":1},{"name":"b","age":8,"class":2}]"#;
    let (status, body) =
        send(&delayed_app(store), request(Method::POST, "/api/v1/students/bulk", Some(payload)))
            .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["kind"], "unavailable");
    assert!(inner.is_empty());
}

#[tokio::test]
async fn single_insert_outlasting_timeout_reports_created() {
    let inner = InMemoryRecordStore::new();
    let store = DelayedStore {
        inner: inner.clone(),
        insert_delay: Duration::from_millis(300),
        ..DelayedStore::default()
    };
    let (status, body) = send(
        &delayed_app(store),
        request(Method::POST, "/api/v1/students", Some(r#"{"name":"Alice","age":12,"class":6}"#)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Alice");
    assert_eq!(inner.len(), 1);
}

// ============================================================================
// SECTION: API Key
// ============================================================================

#[tokio::test]
async fn api_key_guards_api_routes_only() {
    let store = InMemoryRecordStore::new();
    let app = build_router(state_with(&store).with_api_key(API_KEY), 1 << 20);

    let (status, body) = send(&app, request(Method::GET, "/api/v1/students", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["kind"], "unauthorized");

    let mut wrong = request(Method::GET, "/api/v1/students", None);
    wrong.headers_mut().insert("x-api-key", "registry-test-key-0002".parse().unwrap());
    let (status, _) = send(&app, wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut right = request(Method::GET, "/api/v1/students", None);
    right.headers_mut().insert("x-api-key", API_KEY.parse().unwrap());
    let (status, _) = send(&app, right).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, request(Method::GET, "/health", None)).await;
    assert_eq!(status, StatusCode::OK);
}
