// crates/student-registry-config/src/lib.rs
// ============================================================================
// Module: Student Registry Config Library
// Description: Canonical config model, environment overrides, and validation.
// Purpose: Single source of truth for student-registry.toml semantics.
// Dependencies: student-registry-core, student-registry-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `student-registry-config` defines the configuration model for the Student
//! Registry service. Values come from a TOML file, then environment
//! overrides, and are validated fail-closed against hard limits before the
//! server starts.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
