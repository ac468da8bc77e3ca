// crates/student-registry-core/src/memory.rs
// ============================================================================
// Module: In-Memory Record Store
// Description: Process-local record store with staged transactions.
// Purpose: Back tests and ephemeral deployments without a database.
// Dependencies: crate::store, crate::statement
// ============================================================================

//! ## Overview
//! [`InMemoryRecordStore`] keeps records in a `BTreeMap` keyed by id. A bulk
//! transaction holds the store lock for its whole lifetime and stages rows
//! privately; staged rows become visible only on commit and are discarded on
//! rollback or drop.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::record::NewStudent;
use crate::record::Student;
use crate::record::StudentPatch;
use crate::statement::InsertStatement;
use crate::statement::PlaceholderStyle;
use crate::statement::STUDENT_COLUMNS;
use crate::statement::SqlParam;
use crate::store::IngestTransaction;
use crate::store::PageRequest;
use crate::store::RecordStore;
use crate::store::StoreError;

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared mutable state of the in-memory store.
#[derive(Debug)]
struct MemoryState {
    /// Next identifier to assign.
    next_id: i64,
    /// Committed records keyed by id.
    rows: BTreeMap<i64, Student>,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl MemoryState {
    /// Reserves the next identifier.
    const fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// In-memory record store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    /// Shared state guarded by a single mutex.
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    /// Returns true when no record is committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().rows.is_empty()
    }

    /// Acquires the state lock, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Dollar
    }

    fn begin(&self) -> Result<Box<dyn IngestTransaction + '_>, StoreError> {
        Ok(Box::new(MemoryTransaction {
            state: self.lock(),
            staged: Vec::new(),
            open: true,
        }))
    }

    fn insert(&self, student: &NewStudent) -> Result<Student, StoreError> {
        let mut state = self.lock();
        let id = state.allocate_id();
        let stored = Student::from_new(id, student.clone());
        state.rows.insert(id, stored.clone());
        Ok(stored)
    }

    fn get(&self, id: i64) -> Result<Option<Student>, StoreError> {
        Ok(self.lock().rows.get(&id).cloned())
    }

    fn list(&self, page: PageRequest) -> Result<Vec<Student>, StoreError> {
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
        Ok(self.lock().rows.values().skip(offset).take(limit).cloned().collect())
    }

    fn replace(&self, id: i64, student: &NewStudent) -> Result<Option<Student>, StoreError> {
        let mut state = self.lock();
        let Some(slot) = state.rows.get_mut(&id) else {
            return Ok(None);
        };
        *slot = Student::from_new(id, student.clone());
        Ok(Some(slot.clone()))
    }

    fn patch(&self, id: i64, patch: &StudentPatch) -> Result<Option<Student>, StoreError> {
        let mut state = self.lock();
        let Some(slot) = state.rows.get_mut(&id) else {
            return Ok(None);
        };
        *slot = slot.patched(patch);
        Ok(Some(slot.clone()))
    }

    fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.lock().rows.remove(&id).is_some())
    }
}

// ============================================================================
// SECTION: Transaction
// ============================================================================

/// Bulk transaction holding the store lock until it finishes.
struct MemoryTransaction<'a> {
    /// Locked store state.
    state: MutexGuard<'a, MemoryState>,
    /// Rows inserted by this transaction, not yet visible.
    staged: Vec<Student>,
    /// Whether the transaction may still accept work.
    open: bool,
}

impl IngestTransaction for MemoryTransaction<'_> {
    fn insert_returning_ids(
        &mut self,
        statement: &InsertStatement,
    ) -> Result<Vec<i64>, StoreError> {
        if !self.open {
            return Err(StoreError::TransactionClosed);
        }
        let records = decode_rows(statement)?;
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            let id = self.state.allocate_id();
            self.staged.push(Student::from_new(id, record));
            ids.push(id);
        }
        Ok(ids)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if !self.open {
            return Err(StoreError::TransactionClosed);
        }
        self.open = false;
        for student in self.staged.drain(..) {
            self.state.rows.insert(student.id, student);
        }
        Ok(())
    }

    fn rollback(&mut self) {
        self.open = false;
        self.staged.clear();
    }
}

/// Rebuilds records from a statement's positional parameters.
fn decode_rows(statement: &InsertStatement) -> Result<Vec<NewStudent>, StoreError> {
    let width = STUDENT_COLUMNS.len();
    if statement.params.len() != statement.rows * width {
        return Err(StoreError::Invalid(format!(
            "{} params for {} rows",
            statement.params.len(),
            statement.rows
        )));
    }
    statement
        .params
        .chunks(width)
        .map(|row| match row {
            [SqlParam::Text(name), SqlParam::Integer(age), SqlParam::Integer(class)] => {
                Ok(NewStudent::new(name.clone(), *age, *class))
            }
            _ => Err(StoreError::Invalid("unexpected parameter types".to_string())),
        })
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
