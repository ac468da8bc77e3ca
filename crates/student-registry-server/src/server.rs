// crates/student-registry-server/src/server.rs
// ============================================================================
// Module: HTTP Server
// Description: Listener lifecycle with bounded graceful shutdown.
// Purpose: Serve the router until shutdown, then drain or abort in-flight work.
// Dependencies: axum, tokio, student-registry-config
// ============================================================================

//! ## Overview
//! [`StudentRegistryServer::serve_listener`] runs the router and the
//! admission sweeper side by side. When the caller's shutdown future
//! resolves, the listener stops accepting connections and in-flight requests
//! get the configured grace period. After that the state's terminate signal
//! is raised: bulk handlers raise their cancellation flags so open
//! transactions roll back, and every handler answers with the outcome its
//! store work settles on. A server task that still has not finished is
//! aborted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use student_registry_config::StudentRegistryConfig;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::error::ServerError;
use crate::routes::build_router;
use crate::state::AppState;
use crate::sweeper::spawn_sweeper;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Time allowed for terminated handlers to flush their responses.
const TERMINATE_DRAIN: Duration = Duration::from_secs(1);

// ============================================================================
// SECTION: Server
// ============================================================================

/// Student Registry HTTP server.
pub struct StudentRegistryServer {
    /// Validated configuration.
    config: StudentRegistryConfig,
    /// Shared application state.
    state: AppState,
}

impl StudentRegistryServer {
    /// Builds a server from configuration, opening the configured store.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the configuration is invalid or the store
    /// cannot be opened.
    pub fn from_config(config: StudentRegistryConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let state = AppState::from_config(&config)?;
        Ok(Self {
            config,
            state,
        })
    }

    /// Builds a server around existing state.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] when the configuration is invalid.
    pub fn with_state(config: StudentRegistryConfig, state: AppState) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        Ok(Self {
            config,
            state,
        })
    }

    /// Returns the shared application state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| ServerError::Transport(format!("http bind failed: {err}")))?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when the server fails.
    pub async fn serve_listener<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener
            .local_addr()
            .map_err(|err| ServerError::Transport(format!("listener address unavailable: {err}")))?;
        let grace = self.config.server.shutdown_grace();
        let (stop_tx, stop_rx) = watch::channel(false);
        let sweeper = spawn_sweeper(
            self.state.admission().clone(),
            self.config.admission.sweep_interval(),
            stop_rx.clone(),
        );
        let state = self.state.clone();
        let app = build_router(self.state, self.config.server.max_body_bytes);
        let mut drain_rx = stop_rx;
        let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(async move {
                let _ = drain_rx.wait_for(|stopped| *stopped).await;
            });
        let mut server_task = tokio::spawn(async move { server.await });
        tracing::info!(%local, "student registry listening");

        tokio::select! {
            joined = &mut server_task => {
                let _ = stop_tx.send(true);
                let _ = sweeper.await;
                return flatten_server_result(joined);
            }
            () = shutdown => {
                tracing::info!(grace_ms = duration_millis(grace), "shutdown requested; draining");
            }
        }

        let _ = stop_tx.send(true);
        let outcome = match tokio::time::timeout(grace, &mut server_task).await {
            Ok(joined) => flatten_server_result(joined),
            Err(_) => {
                tracing::warn!("shutdown grace period elapsed; terminating in-flight requests");
                state.terminate_in_flight();
                if let Ok(joined) = tokio::time::timeout(TERMINATE_DRAIN, &mut server_task).await {
                    flatten_server_result(joined)
                } else {
                    tracing::warn!("server did not drain; aborting");
                    server_task.abort();
                    let _ = server_task.await;
                    Ok(())
                }
            }
        };
        let _ = sweeper.await;
        tracing::info!("student registry stopped");
        outcome
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Collapses the server task's join and I/O results.
fn flatten_server_result(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), ServerError> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(ServerError::Transport(format!("http server failed: {err}"))),
        Err(err) => Err(ServerError::Transport(format!("http server task failed: {err}"))),
    }
}

/// Converts a duration to whole milliseconds, saturating.
fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
