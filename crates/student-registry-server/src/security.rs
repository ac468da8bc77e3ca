// crates/student-registry-server/src/security.rs
// ============================================================================
// Module: Security Helpers
// Description: Constant-time comparison for API keys.
// Purpose: Avoid timing side-channels when checking caller secrets.
// Dependencies: subtle
// ============================================================================

//! ## Overview
//! Exposes constant-time equality for secret values. Inputs of different
//! lengths compare unequal without inspecting their contents.

use subtle::ConstantTimeEq;

// ============================================================================
// SECTION: Constant-Time Comparisons
// ============================================================================

/// Compares two strings in constant time.
#[must_use]
pub fn constant_time_eq_str(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::constant_time_eq_str;

    #[test]
    fn equal_and_unequal_keys() {
        assert!(constant_time_eq_str("0123456789abcdef", "0123456789abcdef"));
        assert!(!constant_time_eq_str("0123456789abcdef", "0123456789abcdeF"));
        assert!(!constant_time_eq_str("short", "shorter"));
        assert!(!constant_time_eq_str("", "x"));
    }
}
