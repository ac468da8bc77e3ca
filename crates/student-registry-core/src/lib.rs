// crates/student-registry-core/src/lib.rs
// ============================================================================
// Module: Student Registry Core
// Description: Admission control and batched ingestion for student records.
// Purpose: Provide the request-independent engine behind the HTTP service.
// Dependencies: serde, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! Student Registry Core holds the two components of the service with real
//! invariants: the per-client [`AdmissionController`] (token buckets over a
//! self-pruning client registry) and the [`BatchIngestor`] (all-or-nothing
//! bulk insertion in bounded batches). Persistence is reached only through
//! the [`RecordStore`] and [`IngestTransaction`] traits so the core never
//! depends on a concrete database.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod admission;
pub mod ingest;
pub mod memory;
pub mod record;
pub mod statement;
pub mod store;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use admission::AdmissionController;
pub use admission::AdmissionDecision;
pub use admission::AdmissionPolicy;
pub use admission::ClientIdentity;
pub use admission::ClientIdentityError;
pub use ingest::BatchIngestor;
pub use ingest::CancelOnDrop;
pub use ingest::CancellationFlag;
pub use ingest::IngestError;
pub use ingest::parse_payload;
pub use memory::InMemoryRecordStore;
pub use record::NewStudent;
pub use record::Student;
pub use record::StudentPatch;
pub use statement::InsertStatement;
pub use statement::PlaceholderStyle;
pub use statement::STUDENT_COLUMNS;
pub use statement::STUDENTS_TABLE;
pub use statement::SqlParam;
pub use statement::build_insert_statement;
pub use store::IngestTransaction;
pub use store::PageRequest;
pub use store::RecordStore;
pub use store::SharedRecordStore;
pub use store::StoreError;
pub use validation::ValidationError;
pub use validation::validate_patch;
pub use validation::validate_student;
