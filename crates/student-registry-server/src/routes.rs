// crates/student-registry-server/src/routes.rs
// ============================================================================
// Module: Router
// Description: Route table and middleware wiring.
// Purpose: Assemble the axum router served by the Student Registry.
// Dependencies: axum
// ============================================================================

//! ## Overview
//! Only `GET /api/v1/students` passes through admission control. The API key
//! check covers every `/api/v1` route; `/health` bypasses both.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;

use crate::handlers;
use crate::middleware::admit_request;
use crate::middleware::require_api_key;
use crate::state::AppState;

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the application router with a request body limit.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let students = get(handlers::list_students)
        .route_layer(middleware::from_fn_with_state(state.clone(), admit_request))
        .post(handlers::create_student);
    let api = Router::new()
        .route("/students", students)
        .route("/students/bulk", post(handlers::bulk_create_students))
        .route(
            "/students/{id}",
            get(handlers::get_student)
                .put(handlers::replace_student)
                .patch(handlers::patch_student)
                .delete(handlers::delete_student),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));
    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}
