// crates/student-registry-core/src/ingest.rs
// ============================================================================
// Module: Batch Ingestor
// Description: All-or-nothing bulk insertion of student records.
// Purpose: Parse, validate, chunk, and insert a payload in one transaction.
// Dependencies: serde_json, thiserror, tracing, crate::store
// ============================================================================

//! ## Overview
//! [`BatchIngestor::ingest`] accepts a JSON array of records or a single
//! record, validates every record before touching the store, then inserts
//! them in bounded batches inside one transaction. The transaction commits
//! only when every batch succeeded; any store error, a failed commit, or a
//! raised [`CancellationFlag`] rolls it back so no record of the request is
//! persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::slice::Chunks;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use thiserror::Error;

use crate::record::NewStudent;
use crate::record::Student;
use crate::statement::STUDENTS_TABLE;
use crate::statement::build_insert_statement;
use crate::store::IngestTransaction;
use crate::store::RecordStore;
use crate::store::StoreError;
use crate::validation::ValidationError;
use crate::validation::validate_student;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default number of records per insert statement.
pub const DEFAULT_BATCH_SIZE: usize = 3;
/// Default maximum number of records accepted in one payload.
pub const DEFAULT_MAX_RECORDS: usize = 10_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Bulk ingestion errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// Payload is not a record or a non-empty sequence of records.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    /// A record failed validation; nothing was written.
    #[error("invalid student at index {index}: {reason}")]
    ValidationFailure {
        /// Zero-based position of the offending record.
        index: usize,
        /// Validation failure reason.
        reason: ValidationError,
    },
    /// The store failed; the transaction was rolled back.
    #[error("store failure: {0}")]
    StoreFailure(#[from] StoreError),
    /// The owning request went away before commit; the transaction was rolled back.
    #[error("ingestion canceled before commit")]
    Canceled,
}

// ============================================================================
// SECTION: Cancellation
// ============================================================================

/// Shared flag raised when the request owning an ingestion is abandoned.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    /// Raised state shared between the request and the ingestion.
    canceled: Arc<AtomicBool>,
}

impl CancellationFlag {
    /// Creates an unraised flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    /// Returns true once the flag is raised.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    /// Returns a guard that raises the flag when dropped unless disarmed.
    #[must_use]
    pub fn cancel_on_drop(&self) -> CancelOnDrop {
        CancelOnDrop {
            flag: self.clone(),
            armed: true,
        }
    }
}

/// Raises a [`CancellationFlag`] when dropped while armed.
#[derive(Debug)]
pub struct CancelOnDrop {
    /// Flag raised on drop.
    flag: CancellationFlag,
    /// Whether dropping raises the flag.
    armed: bool,
}

impl CancelOnDrop {
    /// Disarms the guard once the ingestion result has been observed.
    pub const fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.flag.cancel();
        }
    }
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses a payload holding either a JSON array of records or one record.
///
/// # Errors
///
/// Returns [`IngestError::MalformedPayload`] when neither shape parses or the
/// sequence is empty.
pub fn parse_payload(payload: &[u8]) -> Result<Vec<NewStudent>, IngestError> {
    let records = match serde_json::from_slice::<Vec<NewStudent>>(payload) {
        Ok(records) => records,
        Err(_) => {
            let single = serde_json::from_slice::<NewStudent>(payload)
                .map_err(|_| IngestError::MalformedPayload("invalid request payload".to_string()))?;
            vec![single]
        }
    };
    if records.is_empty() {
        return Err(IngestError::MalformedPayload("no student data provided".to_string()));
    }
    Ok(records)
}

// ============================================================================
// SECTION: Ingestor
// ============================================================================

/// Batched, transactionally atomic record ingestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchIngestor {
    /// Maximum records per insert statement.
    batch_size: usize,
    /// Maximum records accepted in one payload.
    max_records: usize,
}

impl Default for BatchIngestor {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchIngestor {
    /// Creates an ingestor; a zero batch size is treated as one.
    #[must_use]
    pub const fn new(batch_size: usize) -> Self {
        Self {
            batch_size: if batch_size == 0 { 1 } else { batch_size },
            max_records: DEFAULT_MAX_RECORDS,
        }
    }

    /// Sets the maximum records accepted in one payload.
    #[must_use]
    pub const fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    /// Returns the batch size.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Splits records into consecutive batches, preserving order.
    pub fn batches<'a>(&self, records: &'a [NewStudent]) -> Chunks<'a, NewStudent> {
        records.chunks(self.batch_size)
    }

    /// Parses, validates, and atomically inserts a raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] on malformed input, validation failure, store
    /// failure, or cancellation. No record is persisted on error.
    pub fn ingest(
        &self,
        store: &dyn RecordStore,
        payload: &[u8],
        cancel: &CancellationFlag,
    ) -> Result<Vec<Student>, IngestError> {
        let records = parse_payload(payload)?;
        self.ingest_records(store, records, cancel)
    }

    /// Validates and atomically inserts already-parsed records.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] on validation failure, store failure, or
    /// cancellation. No record is persisted on error.
    pub fn ingest_records(
        &self,
        store: &dyn RecordStore,
        records: Vec<NewStudent>,
        cancel: &CancellationFlag,
    ) -> Result<Vec<Student>, IngestError> {
        if records.is_empty() {
            return Err(IngestError::MalformedPayload("no student data provided".to_string()));
        }
        if records.len() > self.max_records {
            return Err(IngestError::MalformedPayload(format!(
                "too many records: {} (max {})",
                records.len(),
                self.max_records
            )));
        }
        for (index, record) in records.iter().enumerate() {
            validate_student(record).map_err(|reason| IngestError::ValidationFailure {
                index,
                reason,
            })?;
        }
        if cancel.is_canceled() {
            return Err(IngestError::Canceled);
        }

        let mut tx = store.begin()?;
        let inserted = match self.insert_batches(store, tx.as_mut(), &records, cancel) {
            Ok(inserted) => inserted,
            Err(err) => {
                tx.rollback();
                tracing::warn!(records = records.len(), error = %err, "bulk ingestion rolled back");
                return Err(err);
            }
        };
        if cancel.is_canceled() {
            tx.rollback();
            tracing::warn!(records = records.len(), "bulk ingestion canceled before commit");
            return Err(IngestError::Canceled);
        }
        if let Err(err) = tx.commit() {
            tx.rollback();
            tracing::warn!(records = records.len(), error = %err, "bulk ingestion commit failed");
            return Err(IngestError::StoreFailure(err));
        }
        tracing::info!(
            records = inserted.len(),
            batches = records.len().div_ceil(self.batch_size),
            "bulk ingestion committed"
        );
        Ok(inserted)
    }

    /// Executes every batch in order inside `tx`.
    fn insert_batches(
        &self,
        store: &dyn RecordStore,
        tx: &mut (dyn IngestTransaction + '_),
        records: &[NewStudent],
        cancel: &CancellationFlag,
    ) -> Result<Vec<Student>, IngestError> {
        let style = store.placeholder_style();
        let mut inserted = Vec::with_capacity(records.len());
        for batch in self.batches(records) {
            if cancel.is_canceled() {
                return Err(IngestError::Canceled);
            }
            let statement = build_insert_statement(STUDENTS_TABLE, batch, 0, style);
            let ids = tx.insert_returning_ids(&statement)?;
            if ids.len() != batch.len() {
                return Err(IngestError::StoreFailure(StoreError::Invalid(format!(
                    "insert returned {} ids for {} rows",
                    ids.len(),
                    batch.len()
                ))));
            }
            inserted.extend(
                ids.into_iter()
                    .zip(batch.iter().cloned())
                    .map(|(id, record)| Student::from_new(id, record)),
            );
        }
        Ok(inserted)
    }
}
