// crates/student-registry-config/src/config.rs
// ============================================================================
// Module: Student Registry Configuration
// Description: Configuration loading and validation for the Student Registry.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: student-registry-core, student-registry-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits,
//! then environment overrides are applied, then every section is validated.
//! An explicitly named config file must exist; the default file name is
//! optional and its absence yields defaults.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use student_registry_core::AdmissionPolicy;
use student_registry_core::BatchIngestor;
use student_registry_store_sqlite::SqliteStoreConfig;
use student_registry_store_sqlite::SqliteStoreMode;
use student_registry_store_sqlite::SqliteSyncMode;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "student-registry.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "STUDENT_REGISTRY_CONFIG";
/// Environment variable overriding `server.bind`.
pub const BIND_ENV_VAR: &str = "STUDENT_REGISTRY_BIND";
/// Environment variable overriding `store.path`.
pub const DB_PATH_ENV_VAR: &str = "STUDENT_REGISTRY_DB_PATH";
/// Environment variable overriding `admission.capacity`.
pub const RATE_CAPACITY_ENV_VAR: &str = "STUDENT_REGISTRY_RATE_CAPACITY";
/// Environment variable overriding `admission.refill_per_second`.
pub const RATE_REFILL_ENV_VAR: &str = "STUDENT_REGISTRY_RATE_REFILL_PER_SECOND";
/// Environment variable overriding `admission.stale_after_ms`.
pub const RATE_STALE_AFTER_ENV_VAR: &str = "STUDENT_REGISTRY_RATE_STALE_AFTER_MS";
/// Environment variable overriding `admission.sweep_interval_ms`.
pub const RATE_SWEEP_INTERVAL_ENV_VAR: &str = "STUDENT_REGISTRY_RATE_SWEEP_INTERVAL_MS";
/// Environment variable overriding `ingest.batch_size`.
pub const INGEST_BATCH_SIZE_ENV_VAR: &str = "STUDENT_REGISTRY_INGEST_BATCH_SIZE";
/// Environment variable overriding `server.api_key`.
pub const API_KEY_ENV_VAR: &str = "STUDENT_REGISTRY_API_KEY";
/// Environment variable overriding `logging.level`.
pub const LOG_LEVEL_ENV_VAR: &str = "STUDENT_REGISTRY_LOG_LEVEL";

/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;

/// Default bind address.
pub(crate) const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default maximum request body size in bytes.
pub(crate) const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Maximum allowed request body size in bytes.
pub(crate) const MAX_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Default request timeout in milliseconds.
pub(crate) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Minimum request timeout in milliseconds.
pub(crate) const MIN_REQUEST_TIMEOUT_MS: u64 = 100;
/// Maximum request timeout in milliseconds.
pub(crate) const MAX_REQUEST_TIMEOUT_MS: u64 = 300_000;
/// Default shutdown grace period in milliseconds.
pub(crate) const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 10_000;
/// Maximum shutdown grace period in milliseconds.
pub(crate) const MAX_SHUTDOWN_GRACE_MS: u64 = 120_000;
/// Minimum API key length.
pub(crate) const MIN_API_KEY_LENGTH: usize = 16;
/// Maximum API key length.
pub(crate) const MAX_API_KEY_LENGTH: usize = 256;

/// Maximum bucket capacity.
pub(crate) const MAX_RATE_CAPACITY: u32 = 100_000;
/// Maximum refill rate in tokens per second.
pub(crate) const MAX_RATE_REFILL_PER_SECOND: f64 = 100_000.0;
/// Minimum staleness threshold in milliseconds.
pub(crate) const MIN_STALE_AFTER_MS: u64 = 1_000;
/// Maximum staleness threshold in milliseconds.
pub(crate) const MAX_STALE_AFTER_MS: u64 = 86_400_000;
/// Minimum sweep interval in milliseconds.
pub(crate) const MIN_SWEEP_INTERVAL_MS: u64 = 100;
/// Maximum sweep interval in milliseconds.
pub(crate) const MAX_SWEEP_INTERVAL_MS: u64 = 3_600_000;

/// Maximum records per insert batch.
pub(crate) const MAX_BATCH_SIZE: usize = 256;

/// Accepted log level names.
pub(crate) const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

// ============================================================================
// SECTION: Config Root
// ============================================================================

/// Student Registry configuration root.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudentRegistryConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Admission control configuration.
    #[serde(default)]
    pub admission: AdmissionConfig,
    /// Bulk ingestion configuration.
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Record store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StudentRegistryConfig {
    /// Loads configuration from disk using the default resolution rules and
    /// the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| env::var(key).ok())
    }

    /// Loads configuration using `lookup` for every environment read.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (resolved, explicit) = resolve_path(path, &lookup)?;
        validate_path(&resolved)?;
        let mut config = if !explicit && !resolved.exists() {
            Self::default()
        } else {
            Self::from_file(&resolved)?
        };
        config.apply_env_overrides_with(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a config file without overrides or validation.
    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses TOML content without overrides or validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the content is not a valid config.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies `STUDENT_REGISTRY_*` overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an override cannot be parsed.
    pub fn apply_env_overrides_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(BIND_ENV_VAR) {
            self.server.bind = bind;
        }
        if let Some(path) = lookup(DB_PATH_ENV_VAR) {
            self.store.path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(RATE_CAPACITY_ENV_VAR) {
            self.admission.capacity = parse_override(RATE_CAPACITY_ENV_VAR, &raw)?;
        }
        if let Some(raw) = lookup(RATE_REFILL_ENV_VAR) {
            self.admission.refill_per_second = parse_override(RATE_REFILL_ENV_VAR, &raw)?;
        }
        if let Some(raw) = lookup(RATE_STALE_AFTER_ENV_VAR) {
            self.admission.stale_after_ms = parse_override(RATE_STALE_AFTER_ENV_VAR, &raw)?;
        }
        if let Some(raw) = lookup(RATE_SWEEP_INTERVAL_ENV_VAR) {
            self.admission.sweep_interval_ms = parse_override(RATE_SWEEP_INTERVAL_ENV_VAR, &raw)?;
        }
        if let Some(raw) = lookup(INGEST_BATCH_SIZE_ENV_VAR) {
            self.ingest.batch_size = parse_override(INGEST_BATCH_SIZE_ENV_VAR, &raw)?;
        }
        if let Some(key) = lookup(API_KEY_ENV_VAR) {
            self.server.api_key = Some(key);
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV_VAR) {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.admission.validate()?;
        self.ingest.validate()?;
        self.store.validate()?;
        self.logging.validate()
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address (`ip:port`).
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Grace period for in-flight requests on shutdown, in milliseconds.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
    /// Optional API key required on `/api/v1` routes.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
            api_key: None,
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind address: {}", self.bind)))
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Returns the shutdown grace period.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.max_body_bytes == 0 || self.max_body_bytes > MAX_MAX_BODY_BYTES {
            return Err(ConfigError::Invalid(format!(
                "server.max_body_bytes out of range: {} (max {MAX_MAX_BODY_BYTES})",
                self.max_body_bytes
            )));
        }
        if !(MIN_REQUEST_TIMEOUT_MS ..= MAX_REQUEST_TIMEOUT_MS).contains(&self.request_timeout_ms)
        {
            return Err(ConfigError::Invalid(format!(
                "server.request_timeout_ms must be between {MIN_REQUEST_TIMEOUT_MS} and \
                 {MAX_REQUEST_TIMEOUT_MS}"
            )));
        }
        if self.shutdown_grace_ms > MAX_SHUTDOWN_GRACE_MS {
            return Err(ConfigError::Invalid(format!(
                "server.shutdown_grace_ms exceeds {MAX_SHUTDOWN_GRACE_MS}"
            )));
        }
        if let Some(key) = &self.api_key {
            let length = key.chars().count();
            if !(MIN_API_KEY_LENGTH ..= MAX_API_KEY_LENGTH).contains(&length) {
                return Err(ConfigError::Invalid(format!(
                    "server.api_key length must be between {MIN_API_KEY_LENGTH} and \
                     {MAX_API_KEY_LENGTH}"
                )));
            }
            if key.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid(
                    "server.api_key must not contain whitespace".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Returns the default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Returns the default maximum request body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Returns the default request timeout.
const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// Returns the default shutdown grace period.
const fn default_shutdown_grace_ms() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_MS
}

// ============================================================================
// SECTION: Admission
// ============================================================================

/// Admission control configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdmissionConfig {
    /// Bucket capacity (burst size).
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    /// Sustained refill rate in tokens per second.
    #[serde(default = "default_refill_per_second")]
    pub refill_per_second: f64,
    /// Idle time before a client entry is evicted, in milliseconds.
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: u64,
    /// Period between eviction sweeps, in milliseconds.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            refill_per_second: default_refill_per_second(),
            stale_after_ms: default_stale_after_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

impl AdmissionConfig {
    /// Returns the admission policy described by this section.
    #[must_use]
    pub const fn policy(&self) -> AdmissionPolicy {
        AdmissionPolicy {
            capacity: self.capacity,
            refill_per_second: self.refill_per_second,
            stale_after: Duration::from_millis(self.stale_after_ms),
        }
    }

    /// Returns the eviction sweep period.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// Validates admission configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 || self.capacity > MAX_RATE_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "admission.capacity must be between 1 and {MAX_RATE_CAPACITY}"
            )));
        }
        if !self.refill_per_second.is_finite()
            || self.refill_per_second <= 0.0
            || self.refill_per_second > MAX_RATE_REFILL_PER_SECOND
        {
            return Err(ConfigError::Invalid(format!(
                "admission.refill_per_second must be greater than 0 and at most \
                 {MAX_RATE_REFILL_PER_SECOND}"
            )));
        }
        if !(MIN_STALE_AFTER_MS ..= MAX_STALE_AFTER_MS).contains(&self.stale_after_ms) {
            return Err(ConfigError::Invalid(format!(
                "admission.stale_after_ms must be between {MIN_STALE_AFTER_MS} and \
                 {MAX_STALE_AFTER_MS}"
            )));
        }
        if !(MIN_SWEEP_INTERVAL_MS ..= MAX_SWEEP_INTERVAL_MS).contains(&self.sweep_interval_ms) {
            return Err(ConfigError::Invalid(format!(
                "admission.sweep_interval_ms must be between {MIN_SWEEP_INTERVAL_MS} and \
                 {MAX_SWEEP_INTERVAL_MS}"
            )));
        }
        Ok(())
    }
}

/// Returns the default bucket capacity.
const fn default_capacity() -> u32 {
    student_registry_core::admission::DEFAULT_CAPACITY
}

/// Returns the default refill rate.
const fn default_refill_per_second() -> f64 {
    student_registry_core::admission::DEFAULT_REFILL_PER_SECOND
}

/// Returns the default staleness threshold.
fn default_stale_after_ms() -> u64 {
    duration_millis(student_registry_core::admission::DEFAULT_STALE_AFTER)
}

/// Returns the default sweep interval.
fn default_sweep_interval_ms() -> u64 {
    duration_millis(student_registry_core::admission::DEFAULT_SWEEP_INTERVAL)
}

/// Converts a duration to whole milliseconds, saturating.
fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// SECTION: Ingest
// ============================================================================

/// Bulk ingestion configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Records per insert statement.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Maximum records accepted in one payload.
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_records: default_max_records(),
        }
    }
}

impl IngestConfig {
    /// Returns an ingestor configured from this section.
    #[must_use]
    pub const fn ingestor(&self) -> BatchIngestor {
        BatchIngestor::new(self.batch_size).with_max_records(self.max_records)
    }

    /// Validates ingestion configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::Invalid(format!(
                "ingest.batch_size must be between 1 and {MAX_BATCH_SIZE}"
            )));
        }
        if self.max_records == 0 {
            return Err(ConfigError::Invalid(
                "ingest.max_records must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns the default batch size.
const fn default_batch_size() -> usize {
    student_registry_core::ingest::DEFAULT_BATCH_SIZE
}

/// Returns the default payload record cap.
const fn default_max_records() -> usize {
    student_registry_core::ingest::DEFAULT_MAX_RECORDS
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Record store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Durable `SQLite` store.
    #[default]
    Sqlite,
    /// Process-local store; contents are lost on exit.
    Memory,
}

/// Record store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Backend selection.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// `SQLite` busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: default_store_path(),
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the `SQLite` store configuration described by this section.
    #[must_use]
    pub fn sqlite_config(&self) -> SqliteStoreConfig {
        SqliteStoreConfig {
            path: self.path.clone(),
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        }
    }

    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.store_type == StoreType::Sqlite {
            validate_path_string("store.path", &self.path.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Returns the default database path.
fn default_store_path() -> PathBuf {
    PathBuf::from("student-registry.db")
}

/// Returns the default busy timeout.
const fn default_store_busy_timeout_ms() -> u64 {
    5_000
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level filter; `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Validates logging configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.trim().to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Returns the default log level.
fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path; the flag reports whether it was named explicitly.
fn resolve_path<F>(path: Option<&Path>, lookup: &F) -> Result<(PathBuf, bool), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Some(env_path) = lookup(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Parses an environment override value.
fn parse_override<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{name} has an invalid value: {raw}")))
}
