// crates/student-registry-server/src/middleware.rs
// ============================================================================
// Module: Request Middleware
// Description: Admission control and API key checks.
// Purpose: Reject requests before they reach handlers.
// Dependencies: axum, student-registry-core
// ============================================================================

//! ## Overview
//! [`admit_request`] derives the caller identity from the connection's peer
//! address and consults the shared admission controller. A request without a
//! peer address cannot be evaluated and fails as a server fault rather than
//! being silently allowed. [`require_api_key`] is a no-op unless a key is
//! configured.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use student_registry_core::AdmissionDecision;
use student_registry_core::ClientIdentity;
use student_registry_core::ClientIdentityError;

use crate::error::ApiError;
use crate::security::constant_time_eq_str;
use crate::state::AppState;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

// ============================================================================
// SECTION: Middleware
// ============================================================================

/// Applies per-client admission control.
pub async fn admit_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let client = match client_identity(&request) {
        Ok(client) => client,
        Err(err) => return ApiError::from(err).into_response(),
    };
    match state.admission().admit(&client) {
        AdmissionDecision::Allow => next.run(request).await,
        AdmissionDecision::Reject => {
            tracing::debug!(client = %client, "request rejected by admission control");
            ApiError::RateLimited.into_response()
        }
    }
}

/// Requires a matching `X-API-Key` header when a key is configured.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key() else {
        return next.run(request).await;
    };
    let provided = request.headers().get(API_KEY_HEADER).and_then(|value| value.to_str().ok());
    match provided {
        Some(provided) if constant_time_eq_str(provided, expected) => next.run(request).await,
        _ => ApiError::Unauthorized.into_response(),
    }
}

/// Derives the caller identity from the connection peer address.
fn client_identity(request: &Request) -> Result<ClientIdentity, ClientIdentityError> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(peer)| ClientIdentity::from_ip(peer.ip()))
        .ok_or(ClientIdentityError::Missing)
}
