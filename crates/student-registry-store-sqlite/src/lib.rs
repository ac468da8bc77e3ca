// crates/student-registry-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Student Store
// Description: Durable RecordStore backend using SQLite.
// Purpose: Provide persistent storage for the Student Registry service.
// Dependencies: student-registry-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`RecordStore`] implementation. Bulk
//! ingestion runs inside an explicit `BEGIN IMMEDIATE` transaction that is
//! rolled back on error or drop, so a failed batch never leaves partial rows.
//!
//! [`RecordStore`]: student_registry_core::RecordStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteStudentStore;
pub use store::SqliteSyncMode;
