// crates/student-registry-core/src/store.rs
// ============================================================================
// Module: Record Store Interfaces
// Description: Transactional store traits consumed by the core.
// Purpose: Decouple ingestion and CRUD paths from a concrete database.
// Dependencies: thiserror, crate::record, crate::statement
// ============================================================================

//! ## Overview
//! [`RecordStore`] is the persistence boundary. Bulk ingestion goes through
//! [`RecordStore::begin`] and an [`IngestTransaction`]; single-row operations
//! are plain pass-through calls. Implementations must roll back any
//! transaction that is dropped while still open.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::record::NewStudent;
use crate::record::Student;
use crate::record::StudentPatch;
use crate::statement::InsertStatement;
use crate::statement::PlaceholderStyle;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default page number for listings.
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size for listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 3;
/// Maximum page size for listings.
pub const MAX_PAGE_LIMIT: u32 = 1_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Record store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store I/O or locking failure.
    #[error("record store io error: {0}")]
    Io(String),
    /// Database engine reported an error.
    #[error("record store db error: {0}")]
    Db(String),
    /// Store returned data the caller cannot use.
    #[error("record store invalid data: {0}")]
    Invalid(String),
    /// Operation attempted on a transaction that already finished.
    #[error("record store transaction already closed")]
    TransactionClosed,
}

// ============================================================================
// SECTION: Paging
// ============================================================================

/// Page selection for record listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    /// Records per page.
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Builds a page request from raw query values.
    ///
    /// Missing, non-numeric, or non-positive values fall back to the defaults;
    /// the limit is capped at [`MAX_PAGE_LIMIT`].
    #[must_use]
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = parse_positive(page).unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive(limit).unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT);
        Self {
            page,
            limit,
        }
    }

    /// Returns the number of records skipped before this page.
    #[must_use]
    pub const fn offset(self) -> u64 {
        (self.page as u64).saturating_sub(1) * self.limit as u64
    }
}

/// Parses a strictly positive integer.
fn parse_positive(value: Option<&str>) -> Option<u32> {
    value.and_then(|raw| raw.trim().parse::<u32>().ok()).filter(|parsed| *parsed > 0)
}

// ============================================================================
// SECTION: Traits
// ============================================================================

/// Open store transaction used by bulk ingestion.
pub trait IngestTransaction {
    /// Executes a multi-row insert and returns generated ids in row order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when execution or result reading fails.
    fn insert_returning_ids(&mut self, statement: &InsertStatement)
    -> Result<Vec<i64>, StoreError>;

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the commit fails or the transaction is closed.
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Rolls back the transaction. Calling it on a finished transaction is a no-op.
    fn rollback(&mut self);
}

/// Persistence boundary for student records.
pub trait RecordStore {
    /// Placeholder syntax expected by [`IngestTransaction::insert_returning_ids`].
    fn placeholder_style(&self) -> PlaceholderStyle;

    /// Opens a transaction for bulk ingestion.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the transaction cannot be started.
    fn begin(&self) -> Result<Box<dyn IngestTransaction + '_>, StoreError>;

    /// Inserts one record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert(&self, student: &NewStudent) -> Result<Student, StoreError>;

    /// Loads a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn get(&self, id: i64) -> Result<Option<Student>, StoreError>;

    /// Lists records ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn list(&self, page: PageRequest) -> Result<Vec<Student>, StoreError>;

    /// Replaces all fields of a record; `None` when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn replace(&self, id: i64, student: &NewStudent) -> Result<Option<Student>, StoreError>;

    /// Applies a partial update; `None` when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn patch(&self, id: i64, patch: &StudentPatch) -> Result<Option<Student>, StoreError>;

    /// Deletes a record; `false` when the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

// ============================================================================
// SECTION: Shared Store
// ============================================================================

/// Clonable record store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedRecordStore {
    /// Inner store implementation.
    inner: Arc<dyn RecordStore + Send + Sync>,
}

impl SharedRecordStore {
    /// Wraps a record store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl RecordStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn RecordStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl RecordStore for SharedRecordStore {
    fn placeholder_style(&self) -> PlaceholderStyle {
        self.inner.placeholder_style()
    }

    fn begin(&self) -> Result<Box<dyn IngestTransaction + '_>, StoreError> {
        self.inner.begin()
    }

    fn insert(&self, student: &NewStudent) -> Result<Student, StoreError> {
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

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::MAX_PAGE_LIMIT;
    use super::PageRequest;

    #[test]
    fn page_request_falls_back_on_garbage() {
        let page = PageRequest::from_query(Some("abc"), Some("-4"));
        assert_eq!(page, PageRequest::default());
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn page_request_offsets_and_caps() {
        let page = PageRequest::from_query(Some("3"), Some("5"));
        assert_eq!(page.offset(), 10);
        let capped = PageRequest::from_query(None, Some("50000"));
        assert_eq!(capped.limit, MAX_PAGE_LIMIT);
    }
}
