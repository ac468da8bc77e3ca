// crates/student-registry-server/src/handlers.rs
// ============================================================================
// Module: Request Handlers
// Description: Student record endpoints and the liveness probe.
// Purpose: Translate HTTP requests into store and ingestor calls.
// Dependencies: axum, serde, serde_json, tokio, student-registry-core
// ============================================================================

//! ## Overview
//! Store calls are synchronous, so every handler moves its store work onto a
//! blocking thread. Past the request timeout or the server's terminate signal
//! the handler cancels what it can and waits for the work to settle, so the
//! response matches what the store holds. Bodies are read as raw bytes and parsed here so malformed input
//! yields the same JSON error shape as every other failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use student_registry_core::CancellationFlag;
use student_registry_core::NewStudent;
use student_registry_core::PageRequest;
use student_registry_core::RecordStore;
use student_registry_core::SharedRecordStore;
use student_registry_core::Student;
use student_registry_core::StudentPatch;
use student_registry_core::validate_patch;
use student_registry_core::validate_student;
use tokio::task::JoinHandle;

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Raw pagination query; values are parsed leniently.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Requested page number.
    pub page: Option<String>,
    /// Requested page size.
    pub limit: Option<String>,
}

/// Liveness response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: &'static str,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `GET /health`.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
    })
}

/// `GET /api/v1/students`.
///
/// # Errors
///
/// Returns [`ApiError`] when the store fails.
pub async fn list_students(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Student>>, ApiError> {
    let page = PageRequest::from_query(query.page.as_deref(), query.limit.as_deref());
    let students = with_store(&state, move |store| store.list(page)).await??;
    Ok(Json(students))
}

/// `POST /api/v1/students`.
///
/// # Errors
///
/// Returns [`ApiError`] on malformed input, validation failure, or store failure.
pub async fn create_student(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Student>), ApiError> {
    let student: NewStudent = parse_body(&body)?;
    validate_student(&student)?;
    let created = with_store(&state, move |store| store.insert(&student)).await??;
    tracing::info!(id = created.id, "student created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `POST /api/v1/students/bulk`.
///
/// The ingestion runs on a blocking thread. A request timeout or server
/// termination raises the cancellation flag and the handler then waits for
/// the ingestion to settle: rows that committed answer 201, a rollback
/// answers 503. Dropping the handler also raises the flag.
///
/// # Errors
///
/// Returns [`ApiError`] on malformed input, validation failure, store
/// failure, or cancellation.
pub async fn bulk_create_students(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Vec<Student>>), ApiError> {
    let cancel = CancellationFlag::new();
    let mut guard = cancel.cancel_on_drop();
    let store = state.store().clone();
    let ingestor = state.ingestor();
    let task_cancel = cancel.clone();
    let task =
        tokio::task::spawn_blocking(move || ingestor.ingest(&store, &body, &task_cancel));
    let outcome = settle(&state, task, Some(&cancel)).await;
    guard.disarm();
    let inserted = outcome??;
    Ok((StatusCode::CREATED, Json(inserted)))
}

/// `GET /api/v1/students/{id}`.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] for unknown ids.
pub async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Student>, ApiError> {
    let id = parse_id(&id)?;
    let found = with_store(&state, move |store| store.get(id)).await??;
    found.map(Json).ok_or(ApiError::NotFound)
}

/// `PUT /api/v1/students/{id}`.
///
/// # Errors
///
/// Returns [`ApiError`] on malformed input, validation failure, unknown id,
/// or store failure.
pub async fn replace_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Student>, ApiError> {
    let id = parse_id(&id)?;
    let student: NewStudent = parse_body(&body)?;
    validate_student(&student)?;
    let replaced = with_store(&state, move |store| store.replace(id, &student)).await??;
    replaced.map(Json).ok_or(ApiError::NotFound)
}

/// `PATCH /api/v1/students/{id}`.
///
/// # Errors
///
/// Returns [`ApiError`] on malformed or empty patches, validation failure,
/// unknown id, or store failure.
pub async fn patch_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Student>, ApiError> {
    let id = parse_id(&id)?;
    let patch: StudentPatch = parse_body(&body)?;
    if patch.is_empty() {
        return Err(ApiError::Malformed("no fields to update".to_string()));
    }
    validate_patch(&patch)?;
    let patched = with_store(&state, move |store| store.patch(id, &patch)).await??;
    patched.map(Json).ok_or(ApiError::NotFound)
}

/// `DELETE /api/v1/students/{id}`.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] for unknown ids.
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if with_store(&state, move |store| store.delete(id)).await?? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs `work` against the store on a blocking thread and reports its outcome.
async fn with_store<T, F>(state: &AppState, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&SharedRecordStore) -> T + Send + 'static,
{
    let store = state.store().clone();
    let task = tokio::task::spawn_blocking(move || work(&store));
    settle(state, task, None).await
}

/// Waits for a blocking task and returns what it actually did.
///
/// When the request timeout elapses or the server terminates in-flight work,
/// `cancel` is raised and the task is still awaited. A started store call
/// cannot be interrupted, so the response always reflects the final state.
async fn settle<T>(
    state: &AppState,
    mut task: JoinHandle<T>,
    cancel: Option<&CancellationFlag>,
) -> Result<T, ApiError> {
    let reason = tokio::select! {
        joined = &mut task => return joined.map_err(|err| ApiError::Internal(err.to_string())),
        () = tokio::time::sleep(state.request_timeout()) => "request timed out",
        () = state.terminated() => "server shutting down",
    };
    if let Some(cancel) = cancel {
        cancel.cancel();
    }
    tracing::warn!(reason, "store work overran; waiting for its outcome");
    task.await.map_err(|err| ApiError::Internal(err.to_string()))
}

/// Parses a JSON request body.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|_| ApiError::Malformed("invalid request payload".to_string()))
}

/// Parses a record id path segment.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::Malformed(format!("invalid student id: {raw}")))
}
