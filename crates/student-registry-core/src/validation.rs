// crates/student-registry-core/src/validation.rs
// ============================================================================
// Module: Record Validation
// Description: Field-level validation rules for student records.
// Purpose: Reject invalid records before any store interaction.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Validation is a pure predicate over a record. Full records must carry a
//! non-empty name, an age in `1..=120` and a class in `1..=10`. A zero age or
//! class on a full record is reported as "not provided"; on a patch, zero is a
//! provided value and fails the range check instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::record::NewStudent;
use crate::record::StudentPatch;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum accepted age.
pub const MAX_AGE: i64 = 120;
/// Maximum accepted class number.
pub const MAX_CLASS: i64 = 10;
/// Maximum name length in bytes.
pub const MAX_NAME_BYTES: usize = 256;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reason a record failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Name is empty.
    #[error("name is required")]
    NameRequired,
    /// Name exceeds [`MAX_NAME_BYTES`].
    #[error("name is too long")]
    NameTooLong,
    /// Age not provided.
    #[error("provide age")]
    AgeMissing,
    /// Age is zero or negative.
    #[error("age must be a positive number")]
    AgeNotPositive,
    /// Age exceeds [`MAX_AGE`].
    #[error("age is too high")]
    AgeTooHigh,
    /// Class not provided.
    #[error("provide class")]
    ClassMissing,
    /// Class is zero or negative.
    #[error("class must be a positive number")]
    ClassNotPositive,
    /// Class exceeds [`MAX_CLASS`].
    #[error("class is too high")]
    ClassTooHigh,
}

impl ValidationError {
    /// Returns the offending field name.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::NameRequired | Self::NameTooLong => "name",
            Self::AgeMissing | Self::AgeNotPositive | Self::AgeTooHigh => "age",
            Self::ClassMissing | Self::ClassNotPositive | Self::ClassTooHigh => "class",
        }
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a full record.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found, checking name, age, class.
pub fn validate_student(student: &NewStudent) -> Result<(), ValidationError> {
    validate_name(&student.name)?;
    if student.age == 0 {
        return Err(ValidationError::AgeMissing);
    }
    validate_age(student.age)?;
    if student.class == 0 {
        return Err(ValidationError::ClassMissing);
    }
    validate_class(student.class)
}

/// Validates the provided fields of a patch.
///
/// # Errors
///
/// Returns the first [`ValidationError`] among provided fields.
pub fn validate_patch(patch: &StudentPatch) -> Result<(), ValidationError> {
    if let Some(name) = &patch.name {
        validate_name(name)?;
    }
    if let Some(age) = patch.age {
        validate_age(age)?;
    }
    if let Some(class) = patch.class {
        validate_class(class)?;
    }
    Ok(())
}

/// Validates a name value.
fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if name.len() > MAX_NAME_BYTES {
        return Err(ValidationError::NameTooLong);
    }
    Ok(())
}

/// Validates an age value.
const fn validate_age(age: i64) -> Result<(), ValidationError> {
    if age < 1 {
        return Err(ValidationError::AgeNotPositive);
    }
    if age > MAX_AGE {
        return Err(ValidationError::AgeTooHigh);
    }
    Ok(())
}

/// Validates a class value.
const fn validate_class(class: i64) -> Result<(), ValidationError> {
    if class < 1 {
        return Err(ValidationError::ClassNotPositive);
    }
    if class > MAX_CLASS {
        return Err(ValidationError::ClassTooHigh);
    }
    Ok(())
}
