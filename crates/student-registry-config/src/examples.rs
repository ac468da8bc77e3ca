// crates/student-registry-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and the CLI.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for the Student Registry configuration. The example
//! spells out every default so it doubles as a reference.

/// Returns a canonical example `student-registry.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind = "127.0.0.1:8080"
max_body_bytes = 1048576
request_timeout_ms = 30000
shutdown_grace_ms = 10000
# api_key = "change-me-to-a-long-secret"

[admission]
capacity = 5
refill_per_second = 3.0
stale_after_ms = 180000
sweep_interval_ms = 60000

[ingest]
batch_size = 3
max_records = 10000

[store]
type = "sqlite"
path = "student-registry.db"
busy_timeout_ms = 5000
journal_mode = "wal"
sync_mode = "full"

[logging]
level = "info"
json = false
"#,
    )
}
