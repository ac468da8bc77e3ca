// crates/student-registry-core/tests/admission.rs
// ============================================================================
// Module: Admission Controller Tests
// Description: Token-bucket admission and registry eviction behavior.
// ============================================================================
//! ## Overview
//! Validates burst limits, refill timing, per-client isolation under
//! concurrency, stale-entry eviction, and client identity derivation.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use student_registry_core::AdmissionController;
use student_registry_core::AdmissionDecision;
use student_registry_core::AdmissionPolicy;
use student_registry_core::ClientIdentity;
use student_registry_core::ClientIdentityError;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn client(ip: &str) -> ClientIdentity {
    ClientIdentity::from_remote_addr(&format!("{ip}:40000")).expect("identity")
}

fn count_allowed(controller: &AdmissionController, id: &ClientIdentity, now: Instant, n: usize) -> usize {
    (0 .. n).filter(|_| controller.admit_at(id, now) == AdmissionDecision::Allow).count()
}

// ============================================================================
// SECTION: Token Bucket
// ============================================================================

#[test]
fn burst_of_capacity_then_reject() {
    let controller = AdmissionController::default();
    let id = client("10.0.0.1");
    let now = Instant::now();
    assert_eq!(count_allowed(&controller, &id, now, 5), 5);
    assert_eq!(controller.admit_at(&id, now), AdmissionDecision::Reject);
}

#[test]
fn refill_restores_tokens_at_configured_rate() {
    let controller = AdmissionController::default();
    let id = client("10.0.0.2");
    let start = Instant::now();
    assert_eq!(count_allowed(&controller, &id, start, 6), 5);

    // One second at 3 tokens/s buys exactly three more requests.
    let later = start + Duration::from_secs(1);
    assert_eq!(count_allowed(&controller, &id, later, 4), 3);

    // A long idle period never exceeds capacity.
    let much_later = later + Duration::from_secs(120);
    assert_eq!(count_allowed(&controller, &id, much_later, 10), 5);
}

#[test]
fn fractional_refill_accumulates() {
    let controller = AdmissionController::default();
    let id = client("10.0.0.3");
    let start = Instant::now();
    assert_eq!(count_allowed(&controller, &id, start, 5), 5);
    let almost = start + Duration::from_millis(300);
    assert_eq!(controller.admit_at(&id, almost), AdmissionDecision::Reject);
    let enough = start + Duration::from_millis(340);
    assert_eq!(controller.admit_at(&id, enough), AdmissionDecision::Allow);
}

#[test]
fn clients_are_isolated() {
    let controller = AdmissionController::default();
    let a = client("10.0.0.4");
    let b = client("10.0.0.5");
    let now = Instant::now();
    assert_eq!(count_allowed(&controller, &a, now, 10), 5);
    assert_eq!(count_allowed(&controller, &b, now, 10), 5);
    assert_eq!(controller.tracked_clients(), 2);
}

#[test]
fn concurrent_first_requests_share_one_bucket() {
    let controller = Arc::new(AdmissionController::new(AdmissionPolicy {
        capacity: 5,
        refill_per_second: 0.001,
        stale_after: Duration::from_secs(180),
    }));
    let now = Instant::now();
    let handles: Vec<_> = (0 .. 8)
        .map(|worker| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                let shared = client("192.168.1.1");
                let own = client(&format!("172.16.0.{worker}"));
                let shared_allowed = count_allowed(&controller, &shared, now, 4);
                let own_allowed = count_allowed(&controller, &own, now, 7);
                (shared_allowed, own_allowed)
            })
        })
        .collect();
    let results: Vec<(usize, usize)> =
        handles.into_iter().map(|handle| handle.join().expect("worker")).collect();
    let shared_total: usize = results.iter().map(|(shared, _)| shared).sum();
    assert_eq!(shared_total, 5);
    assert!(results.iter().all(|(_, own)| *own == 5));
    assert_eq!(controller.tracked_clients(), 9);
}

// ============================================================================
// SECTION: Eviction
// ============================================================================

#[test]
fn sweep_evicts_only_stale_clients() {
    let controller = AdmissionController::default();
    let stale = client("10.1.0.1");
    let fresh = client("10.1.0.2");
    let start = Instant::now();
    controller.admit_at(&stale, start);
    controller.admit_at(&fresh, start + Duration::from_secs(150));

    let evicted = controller.sweep_at(start + Duration::from_secs(181));
    assert_eq!(evicted, 1);
    assert!(!controller.is_tracked(&stale));
    assert!(controller.is_tracked(&fresh));
}

#[test]
fn client_at_threshold_is_kept() {
    let controller = AdmissionController::default();
    let id = client("10.1.0.3");
    let start = Instant::now();
    controller.admit_at(&id, start);
    assert_eq!(controller.sweep_at(start + Duration::from_secs(180)), 0);
    assert!(controller.is_tracked(&id));
}

#[test]
fn evicted_client_returns_with_full_bucket() {
    let controller = AdmissionController::default();
    let id = client("10.1.0.4");
    let start = Instant::now();
    assert_eq!(count_allowed(&controller, &id, start, 6), 5);
    let later = start + Duration::from_secs(200);
    controller.sweep_at(later);
    assert!(!controller.is_tracked(&id));
    assert_eq!(count_allowed(&controller, &id, later, 6), 5);
}

// ============================================================================
// SECTION: Identity
// ============================================================================

#[test]
fn identity_strips_port() {
    assert_eq!(client("203.0.113.7").as_str(), "203.0.113.7");
    let v6 = ClientIdentity::from_remote_addr("[2001:db8::1]:8443").expect("v6");
    assert_eq!(v6.as_str(), "2001:db8::1");
    let host = ClientIdentity::from_remote_addr("Gateway.Local:80").expect("host");
    assert_eq!(host.to_string(), "gateway.local");
}

#[test]
fn same_host_different_ports_share_identity() {
    let a = ClientIdentity::from_remote_addr("198.51.100.1:1000").expect("a");
    let b = ClientIdentity::from_remote_addr("198.51.100.1:2000").expect("b");
    assert_eq!(a, b);
}

#[test]
fn textual_and_socket_origins_agree() {
    for raw in ["203.0.113.7:40000", "[2001:db8::1]:8443"] {
        let socket: SocketAddr = raw.parse().expect("socket");
        let parsed = ClientIdentity::from_remote_addr(raw).expect("parsed");
        assert_eq!(parsed, ClientIdentity::from_ip(socket.ip()), "{raw}");
    }
}

#[test]
fn unparsable_remote_addresses_are_rejected() {
    for raw in ["", "no-port", "host:notaport", ":80", "2001:db8::1"] {
        assert!(
            matches!(ClientIdentity::from_remote_addr(raw), Err(ClientIdentityError::Unparsable(_))),
            "{raw}"
        );
    }
}
