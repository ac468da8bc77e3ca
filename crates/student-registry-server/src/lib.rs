// crates/student-registry-server/src/lib.rs
// ============================================================================
// Module: Student Registry Server
// Description: HTTP surface for the Student Registry service.
// Purpose: Route requests through admission control into the record store.
// Dependencies: student-registry-core, student-registry-config, axum, tokio
// ============================================================================

//! ## Overview
//! The server exposes student records under `/api/v1` and a liveness probe
//! at `/health`. Listing is gated by the per-client
//! [`AdmissionController`](student_registry_core::AdmissionController); bulk
//! creation runs the [`BatchIngestor`](student_registry_core::BatchIngestor)
//! on a blocking thread tied to a cancellation flag, so an abandoned or timed
//! out request rolls back whatever it has not yet committed. Shutdown stops
//! accepting connections and waits up to a grace deadline for in-flight
//! requests before terminating whatever remains.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod server;
pub mod state;
pub mod sweeper;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use error::ApiError;
pub use error::ServerError;
pub use logging::init_logging;
pub use routes::build_router;
pub use server::StudentRegistryServer;
pub use state::AppState;
pub use sweeper::spawn_sweeper;
