// crates/student-registry-server/src/error.rs
// ============================================================================
// Module: Server Errors
// Description: HTTP error mapping and server lifecycle errors.
// Purpose: Give every failure a stable status code and JSON body.
// Dependencies: axum, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`ApiError`] is returned by every handler and middleware. Client faults
//! (malformed input, validation, rate limiting, auth) carry their message to
//! the caller; server faults are logged in full and reported with a generic
//! message. The body shape is always `{"error": {"kind", "message"}}`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;
use student_registry_core::ClientIdentityError;
use student_registry_core::IngestError;
use student_registry_core::StoreError;
use student_registry_core::ValidationError;
use thiserror::Error;

// ============================================================================
// SECTION: API Errors
// ============================================================================

/// Request-level error rendered as an HTTP response.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller address could not be turned into a client identity.
    #[error("client identity unavailable: {0}")]
    ClientIdentity(#[from] ClientIdentityError),
    /// Admission controller rejected the request.
    #[error("rate limit exceeded")]
    RateLimited,
    /// Missing or wrong API key.
    #[error("missing or invalid api key")]
    Unauthorized,
    /// Request body or path could not be parsed.
    #[error("{0}")]
    Malformed(String),
    /// A record failed validation.
    #[error("{}", validation_message(.index, .reason))]
    Validation {
        /// Position in a bulk payload, when applicable.
        index: Option<usize>,
        /// Validation failure reason.
        reason: ValidationError,
    },
    /// No record with the requested id.
    #[error("student not found")]
    NotFound,
    /// The record store failed.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
    /// The request was canceled or timed out before completing.
    #[error("{0}")]
    Unavailable(String),
    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::ClientIdentity(_) | Self::Store(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Malformed(_) | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Returns the stable machine-readable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ClientIdentity(_) => "client_identity",
            Self::RateLimited => "rate_limited",
            Self::Unauthorized => "unauthorized",
            Self::Malformed(_) => "malformed_payload",
            Self::Validation { .. } => "validation_failure",
            Self::NotFound => "not_found",
            Self::Store(_) => "store_failure",
            Self::Unavailable(_) => "unavailable",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(error: IngestError) -> Self {
        match error {
            IngestError::MalformedPayload(message) => Self::Malformed(message),
            IngestError::ValidationFailure {
                index,
                reason,
            } => Self::Validation {
                index: Some(index),
                reason,
            },
            IngestError::StoreFailure(err) => Self::Store(err),
            IngestError::Canceled => Self::Unavailable("ingestion canceled".to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(reason: ValidationError) -> Self {
        Self::Validation {
            index: None,
            reason,
        }
    }
}

/// Formats a validation message, prefixing the record index when present.
fn validation_message(index: &Option<usize>, reason: &ValidationError) -> String {
    match index {
        Some(index) => format!("student at index {index}: {reason}"),
        None => reason.to_string(),
    }
}

/// JSON error envelope.
#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    /// Error details.
    error: ErrorBody<'a>,
}

/// JSON error details.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    /// Machine-readable kind.
    kind: &'a str,
    /// Human-readable message.
    message: String,
    /// Offending field for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'a str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(kind = self.kind(), error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        let field = match &self {
            Self::Validation {
                reason, ..
            } => Some(reason.field()),
            _ => None,
        };
        let body = ErrorEnvelope {
            error: ErrorBody {
                kind: self.kind(),
                message,
                field,
            },
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// SECTION: Server Errors
// ============================================================================

/// Server lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
