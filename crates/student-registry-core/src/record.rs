// crates/student-registry-core/src/record.rs
// ============================================================================
// Module: Student Records
// Description: Domain types for stored and submitted student records.
// Purpose: Separate store-assigned identity from caller-supplied fields.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Student`] is a persisted row and always carries a store-assigned `id`.
//! Callers submit [`NewStudent`] values, which have no `id` at all; an `id`
//! present in a JSON payload is ignored during deserialization. Missing
//! numeric fields default to zero so validation, not parsing, reports them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Persisted student record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Store-assigned identifier.
    pub id: i64,
    /// Student name.
    pub name: String,
    /// Age in years.
    pub age: i64,
    /// Class (grade) number.
    pub class: i64,
}

impl Student {
    /// Pairs a submitted record with its store-assigned identifier.
    #[must_use]
    pub fn from_new(id: i64, student: NewStudent) -> Self {
        Self {
            id,
            name: student.name,
            age: student.age,
            class: student.class,
        }
    }

    /// Returns a copy of this record with the patch applied.
    #[must_use]
    pub fn patched(&self, patch: &StudentPatch) -> Self {
        Self {
            id: self.id,
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            age: patch.age.unwrap_or(self.age),
            class: patch.class.unwrap_or(self.class),
        }
    }
}

/// Candidate record submitted for insertion or replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NewStudent {
    /// Student name.
    #[serde(default)]
    pub name: String,
    /// Age in years.
    #[serde(default)]
    pub age: i64,
    /// Class (grade) number.
    #[serde(default)]
    pub class: i64,
}

impl NewStudent {
    /// Builds a candidate record.
    #[must_use]
    pub fn new(name: impl Into<String>, age: i64, class: i64) -> Self {
        Self {
            name: name.into(),
            age,
            class,
        }
    }
}

/// Partial update for a stored record.
///
/// # Invariants
/// - `None` means "leave unchanged"; `Some(0)` is a provided value and is
///   validated like any other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StudentPatch {
    /// Replacement name.
    #[serde(default)]
    pub name: Option<String>,
    /// Replacement age.
    #[serde(default)]
    pub age: Option<i64>,
    /// Replacement class.
    #[serde(default)]
    pub class: Option<i64>,
}

impl StudentPatch {
    /// Returns true when no field is provided.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.class.is_none()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
