// crates/student-registry-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Student Store
// Description: Durable RecordStore backed by SQLite.
// Purpose: Persist student records with all-or-nothing bulk inserts.
// Dependencies: student-registry-core, rusqlite, serde, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`SqliteStudentStore`] serializes access to a single `SQLite` connection
//! through a mutex. Bulk ingestion holds that mutex for the lifetime of the
//! transaction, issuing `BEGIN IMMEDIATE` up front and `ROLLBACK` on any
//! failure or drop. Database contents are untrusted: rows are decoded with
//! typed accessors and schema versions are checked on open.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use serde::Deserialize;
use serde::Serialize;
use student_registry_core::IngestTransaction;
use student_registry_core::InsertStatement;
use student_registry_core::NewStudent;
use student_registry_core::PageRequest;
use student_registry_core::PlaceholderStyle;
use student_registry_core::RecordStore;
use student_registry_core::SqlParam;
use student_registry_core::StoreError;
use student_registry_core::Student;
use student_registry_core::StudentPatch;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Default database file name.
const DEFAULT_STORE_PATH: &str = "student-registry.db";
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` student store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl SqliteStoreConfig {
    /// Builds a default configuration for the given database path.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Returns the default database path.
fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding record payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Db(message),
            SqliteStoreError::VersionMismatch(message) => {
                Self::Db(format!("schema version mismatch: {message}"))
            }
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

impl From<rusqlite::Error> for SqliteStoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Db(error.to_string())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed student record store.
///
/// # Invariants
/// - `SQLite` connection access is serialized through a mutex.
/// - A bulk transaction owns the mutex guard until it commits or rolls back.
#[derive(Clone)]
pub struct SqliteStudentStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStudentStore {
    /// Opens an `SQLite`-backed student store, creating the schema when absent.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        tracing::debug!(path = %config.path.display(), "sqlite student store opened");
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Acquires the connection lock.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))
    }

    /// Loads a record by id on an already locked connection.
    fn fetch(connection: &Connection, id: i64) -> Result<Option<Student>, SqliteStoreError> {
        connection
            .query_row(
                "SELECT id, name, age, class FROM students WHERE id = ?1",
                params![id],
                map_student_row,
            )
            .optional()
            .map_err(SqliteStoreError::from)
    }
}

impl RecordStore for SqliteStudentStore {
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Numbered
    }

    fn begin(&self) -> Result<Box<dyn IngestTransaction + '_>, StoreError> {
        let connection = self.lock()?;
        connection.execute_batch("BEGIN IMMEDIATE").map_err(SqliteStoreError::from)?;
        Ok(Box::new(SqliteIngestTransaction {
            connection,
            open: true,
        }))
    }

    fn insert(&self, student: &NewStudent) -> Result<Student, StoreError> {
        let connection = self.lock()?;
        let id: i64 = connection
            .query_row(
                "INSERT INTO students (name, age, class) VALUES (?1, ?2, ?3) RETURNING id",
                params![student.name, student.age, student.class],
                |row| row.get(0),
            )
            .map_err(SqliteStoreError::from)?;
        Ok(Student::from_new(id, student.clone()))
    }

    fn get(&self, id: i64) -> Result<Option<Student>, StoreError> {
        let connection = self.lock()?;
        Ok(Self::fetch(&connection, id)?)
    }

    fn list(&self, page: PageRequest) -> Result<Vec<Student>, StoreError> {
        let offset = i64::try_from(page.offset())
            .map_err(|_| SqliteStoreError::Invalid("page offset out of range".to_string()))?;
        let connection = self.lock()?;
        let mut statement = connection
            .prepare("SELECT id, name, age, class FROM students ORDER BY id LIMIT ?1 OFFSET ?2")
            .map_err(SqliteStoreError::from)?;
        let rows = statement
            .query_map(params![i64::from(page.limit), offset], map_student_row)
            .map_err(SqliteStoreError::from)?;
        let mut students = Vec::new();
        for row in rows {
            students.push(row.map_err(SqliteStoreError::from)?);
        }
        Ok(students)
    }

    fn replace(&self, id: i64, student: &NewStudent) -> Result<Option<Student>, StoreError> {
        let connection = self.lock()?;
        let changed = connection
            .execute(
                "UPDATE students SET name = ?1, age = ?2, class = ?3 WHERE id = ?4",
                params![student.name, student.age, student.class, id],
            )
            .map_err(SqliteStoreError::from)?;
        if changed == 0 {
            return Ok(None);
        }
        Ok(Some(Student::from_new(id, student.clone())))
    }

    fn patch(&self, id: i64, patch: &StudentPatch) -> Result<Option<Student>, StoreError> {
        let mut connection = self.lock()?;
        let tx = connection.transaction().map_err(SqliteStoreError::from)?;
        let Some(current) = Self::fetch(&tx, id)? else {
            return Ok(None);
        };
        let updated = current.patched(patch);
        tx.execute(
            "UPDATE students SET name = ?1, age = ?2, class = ?3 WHERE id = ?4",
            params![updated.name, updated.age, updated.class, id],
        )
        .map_err(SqliteStoreError::from)?;
        tx.commit().map_err(SqliteStoreError::from)?;
        Ok(Some(updated))
    }

    fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let connection = self.lock()?;
        let changed = connection
            .execute("DELETE FROM students WHERE id = ?1", params![id])
            .map_err(SqliteStoreError::from)?;
        Ok(changed > 0)
    }
}

// ============================================================================
// SECTION: Transaction
// ============================================================================

/// Bulk transaction over the locked connection.
///
/// # Invariants
/// - While `open`, the connection is inside a `BEGIN IMMEDIATE` transaction.
/// - Dropping an open transaction rolls it back.
struct SqliteIngestTransaction<'a> {
    /// Locked connection.
    connection: MutexGuard<'a, Connection>,
    /// Whether a transaction is in progress.
    open: bool,
}

impl IngestTransaction for SqliteIngestTransaction<'_> {
    fn insert_returning_ids(
        &mut self,
        statement: &InsertStatement,
    ) -> Result<Vec<i64>, StoreError> {
        if !self.open {
            return Err(StoreError::TransactionClosed);
        }
        if statement.rows == 0 {
            return Ok(Vec::new());
        }
        let values = statement.params.iter().map(sql_value);
        let mut prepared = self.connection.prepare(&statement.text).map_err(SqliteStoreError::from)?;
        let rows = prepared
            .query_map(params_from_iter(values), |row| row.get::<_, i64>(0))
            .map_err(SqliteStoreError::from)?;
        let mut ids = Vec::with_capacity(statement.rows);
        for row in rows {
            ids.push(row.map_err(SqliteStoreError::from)?);
        }
        // RETURNING order is unspecified; rowids follow VALUES order.
        ids.sort_unstable();
        Ok(ids)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if !self.open {
            return Err(StoreError::TransactionClosed);
        }
        self.connection.execute_batch("COMMIT").map_err(SqliteStoreError::from)?;
        self.open = false;
        Ok(())
    }

    fn rollback(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(err) = self.connection.execute_batch("ROLLBACK") {
            tracing::warn!(error = %err, "sqlite rollback failed");
        }
    }
}

impl Drop for SqliteIngestTransaction<'_> {
    fn drop(&mut self) {
        self.rollback();
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts a statement parameter into an `SQLite` value.
fn sql_value(param: &SqlParam) -> Value {
    match param {
        SqlParam::Text(text) => Value::Text(text.clone()),
        SqlParam::Integer(value) => Value::Integer(*value),
    }
}

/// Decodes a `students` row.
fn map_student_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        class: row.get(3)?,
    })
}

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.execute_batch(&format!(
        "PRAGMA journal_mode = {};",
        config.journal_mode.pragma_value()
    ))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS students (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    age INTEGER NOT NULL,
                    class INTEGER NOT NULL
                );",
            )?;
        }
        Some(SCHEMA_VERSION) => {}
        Some(other) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "expected {SCHEMA_VERSION}, found {other}"
            )));
        }
    }
    tx.commit()?;
    Ok(())
}
