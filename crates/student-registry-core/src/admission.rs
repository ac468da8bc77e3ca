// crates/student-registry-core/src/admission.rs
// ============================================================================
// Module: Admission Controller
// Description: Per-client token-bucket admission over a self-pruning registry.
// Purpose: Bound request throughput per client before business logic runs.
// Dependencies: thiserror, tracing
// ============================================================================

//! ## Overview
//! Every client identity owns an independent token bucket. [`AdmissionController::admit`]
//! creates the bucket on first sight, refills it from elapsed time, and
//! consumes one token if available. The registry map and its mutex are
//! private: the existence check, creation, refill, and consumption all happen
//! inside one critical section, and [`AdmissionController::sweep`] evicts
//! stale clients under the same lock.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default bucket capacity (burst size).
pub const DEFAULT_CAPACITY: u32 = 5;
/// Default sustained refill rate in tokens per second.
pub const DEFAULT_REFILL_PER_SECOND: f64 = 3.0;
/// Default idle time after which a client entry is evicted.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(180);
/// Default period between eviction sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Errors deriving a client identity from a request origin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientIdentityError {
    /// The request carried no origin address.
    #[error("client address missing")]
    Missing,
    /// The origin address could not be parsed.
    #[error("client address unparsable: {0}")]
    Unparsable(String),
}

/// Identity of a calling client (origin host without port).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Derives an identity from a `host:port` origin string, stripping the port.
    ///
    /// The HTTP server builds identities from the listener's socket address
    /// with [`ClientIdentity::from_ip`]. This parser serves origins that only
    /// exist as text, such as a host name or a forwarded address. IP origins
    /// yield the same identity through either path.
    ///
    /// # Errors
    ///
    /// Returns [`ClientIdentityError::Unparsable`] when the text is not a
    /// `host:port` pair.
    pub fn from_remote_addr(remote: &str) -> Result<Self, ClientIdentityError> {
        let trimmed = remote.trim();
        if let Ok(addr) = trimmed.parse::<SocketAddr>() {
            return Ok(Self::from_ip(addr.ip()));
        }
        let unparsable = || ClientIdentityError::Unparsable(trimmed.to_string());
        let (host, port) = trimmed.rsplit_once(':').ok_or_else(unparsable)?;
        if host.is_empty() || host.contains(':') || port.parse::<u16>().is_err() {
            return Err(unparsable());
        }
        Ok(Self(host.to_ascii_lowercase()))
    }

    /// Builds an identity from an IP address.
    #[must_use]
    pub fn from_ip(ip: IpAddr) -> Self {
        Self(ip.to_string())
    }

    /// Returns the identity text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Admission decision for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Request may proceed.
    Allow,
    /// Request exceeds the client's rate and must be rejected.
    Reject,
}

/// Token-bucket and eviction parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdmissionPolicy {
    /// Maximum tokens a bucket holds.
    pub capacity: u32,
    /// Tokens added per second of elapsed time.
    pub refill_per_second: f64,
    /// Idle time after which a client entry is evicted.
    pub stale_after: Duration,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            refill_per_second: DEFAULT_REFILL_PER_SECOND,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

// ============================================================================
// SECTION: Token Bucket
// ============================================================================

/// Lazily refilled token bucket.
///
/// # Invariants
/// - `0.0 <= tokens <= capacity`.
#[derive(Debug, Clone)]
struct TokenBucket {
    /// Maximum tokens.
    capacity: f64,
    /// Refill rate in tokens per second.
    refill_per_second: f64,
    /// Currently available tokens.
    tokens: f64,
    /// Instant of the last refill computation.
    last_refill: Instant,
}

impl TokenBucket {
    /// Creates a full bucket.
    fn full(policy: &AdmissionPolicy, now: Instant) -> Self {
        let capacity = f64::from(policy.capacity);
        Self {
            capacity,
            refill_per_second: policy.refill_per_second,
            tokens: capacity,
            last_refill: now,
        }
    }

    /// Adds tokens for the time elapsed since the last refill.
    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = elapsed.mul_add(self.refill_per_second, self.tokens).min(self.capacity);
        if now > self.last_refill {
            self.last_refill = now;
        }
    }

    /// Consumes one token when available.
    fn try_take(&mut self) -> bool {
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Registry entry for one client.
#[derive(Debug, Clone)]
struct ClientEntry {
    /// Client bucket.
    bucket: TokenBucket,
    /// Instant of the most recent request.
    last_seen: Instant,
}

// ============================================================================
// SECTION: Controller
// ============================================================================

/// Per-client admission controller.
///
/// # Invariants
/// - At most one entry exists per [`ClientIdentity`].
/// - Every read or write of the registry happens under `clients`' lock.
#[derive(Debug)]
pub struct AdmissionController {
    /// Bucket and eviction parameters.
    policy: AdmissionPolicy,
    /// Client registry guarded by a single mutex.
    clients: Mutex<HashMap<ClientIdentity, ClientEntry>>,
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::new(AdmissionPolicy::default())
    }
}

impl AdmissionController {
    /// Creates a controller with an empty registry.
    #[must_use]
    pub fn new(policy: AdmissionPolicy) -> Self {
        Self {
            policy,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the configured policy.
    #[must_use]
    pub const fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    /// Decides whether a request from `client` may proceed now.
    pub fn admit(&self, client: &ClientIdentity) -> AdmissionDecision {
        self.admit_at(client, Instant::now())
    }

    /// Decides whether a request from `client` may proceed at `now`.
    pub fn admit_at(&self, client: &ClientIdentity, now: Instant) -> AdmissionDecision {
        let mut clients = self.lock();
        let entry = clients.entry(client.clone()).or_insert_with(|| ClientEntry {
            bucket: TokenBucket::full(&self.policy, now),
            last_seen: now,
        });
        if now > entry.last_seen {
            entry.last_seen = now;
        }
        entry.bucket.refill(now);
        if entry.bucket.try_take() {
            AdmissionDecision::Allow
        } else {
            AdmissionDecision::Reject
        }
    }

    /// Evicts clients idle for longer than the staleness threshold.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Evicts clients idle at `now` for longer than the staleness threshold.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let stale_after = self.policy.stale_after;
        let mut clients = self.lock();
        let before = clients.len();
        clients.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= stale_after);
        let evicted = before - clients.len();
        drop(clients);
        if evicted > 0 {
            tracing::debug!(evicted, "evicted stale admission clients");
        }
        evicted
    }

    /// Returns the number of tracked clients.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    /// Returns true when `client` has a registry entry.
    #[must_use]
    pub fn is_tracked(&self, client: &ClientIdentity) -> bool {
        self.lock().contains_key(client)
    }

    /// Acquires the registry lock.
    ///
    /// Every critical section leaves the map consistent, so a poisoned lock is
    /// recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, HashMap<ClientIdentity, ClientEntry>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
