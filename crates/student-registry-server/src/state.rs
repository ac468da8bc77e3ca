// crates/student-registry-server/src/state.rs
// ============================================================================
// Module: Application State
// Description: Shared state handed to every handler and middleware.
// Purpose: Bundle the store, admission controller, and request limits.
// Dependencies: student-registry-core, student-registry-config, student-registry-store-sqlite
// ============================================================================

//! ## Overview
//! [`AppState`] is cheap to clone: the store, admission controller, and
//! terminate signal are reference counted and every other field is a small
//! value. The terminate signal is raised once the shutdown grace period has
//! elapsed; handlers race their store work against it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use student_registry_config::StoreType;
use student_registry_config::StudentRegistryConfig;
use student_registry_core::AdmissionController;
use student_registry_core::BatchIngestor;
use student_registry_core::InMemoryRecordStore;
use student_registry_core::SharedRecordStore;
use student_registry_store_sqlite::SqliteStudentStore;
use tokio::sync::watch;

use crate::error::ServerError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default per-request timeout for store work.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Record store.
    store: SharedRecordStore,
    /// Per-client admission controller.
    admission: Arc<AdmissionController>,
    /// Bulk ingestor.
    ingestor: BatchIngestor,
    /// Optional API key guarding `/api/v1`.
    api_key: Option<Arc<str>>,
    /// Upper bound on store work per request.
    request_timeout: Duration,
    /// Raised when in-flight requests must stop.
    terminate: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// Creates state with no API key and the default request timeout.
    #[must_use]
    pub fn new(
        store: SharedRecordStore,
        admission: Arc<AdmissionController>,
        ingestor: BatchIngestor,
    ) -> Self {
        Self {
            store,
            admission,
            ingestor,
            api_key: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            terminate: Arc::new(watch::Sender::new(false)),
        }
    }

    /// Requires `key` in the `X-API-Key` header of every `/api/v1` request.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the upper bound on store work per request.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builds state from validated configuration, opening the configured store.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Init`] when the store cannot be opened.
    pub fn from_config(config: &StudentRegistryConfig) -> Result<Self, ServerError> {
        let store = match config.store.store_type {
            StoreType::Memory => {
                tracing::warn!("using in-memory store; records are lost on exit");
                SharedRecordStore::from_store(InMemoryRecordStore::new())
            }
            StoreType::Sqlite => {
                let store = SqliteStudentStore::new(config.store.sqlite_config())
                    .map_err(|err| ServerError::Init(err.to_string()))?;
                SharedRecordStore::from_store(store)
            }
        };
        let admission = Arc::new(AdmissionController::new(config.admission.policy()));
        let mut state = Self::new(store, admission, config.ingest.ingestor())
            .with_request_timeout(config.server.request_timeout());
        if let Some(key) = &config.server.api_key {
            state = state.with_api_key(key.as_str());
        }
        Ok(state)
    }

    /// Returns the record store.
    #[must_use]
    pub const fn store(&self) -> &SharedRecordStore {
        &self.store
    }

    /// Returns the admission controller.
    #[must_use]
    pub const fn admission(&self) -> &Arc<AdmissionController> {
        &self.admission
    }

    /// Returns the bulk ingestor.
    #[must_use]
    pub const fn ingestor(&self) -> BatchIngestor {
        self.ingestor
    }

    /// Returns the configured API key, if any.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Signals every in-flight request to cancel its store work.
    pub fn terminate_in_flight(&self) {
        self.terminate.send_replace(true);
    }

    /// Resolves once [`AppState::terminate_in_flight`] has been called.
    pub async fn terminated(&self) {
        let mut signal = self.terminate.subscribe();
        loop {
            if *signal.borrow_and_update() {
                return;
            }
            if signal.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
