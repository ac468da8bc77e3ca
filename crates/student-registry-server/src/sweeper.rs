// crates/student-registry-server/src/sweeper.rs
// ============================================================================
// Module: Admission Sweeper
// Description: Periodic eviction of idle admission clients.
// Purpose: Keep the client registry bounded independently of request traffic.
// Dependencies: tokio, student-registry-core
// ============================================================================

//! ## Overview
//! The sweeper runs on its own task and touches the registry only through
//! [`AdmissionController::sweep`], so it shares nothing with request handling
//! beyond the registry lock. It exits when the shutdown channel flips to
//! `true` or its sender is dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use student_registry_core::AdmissionController;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

// ============================================================================
// SECTION: Sweeper
// ============================================================================

/// Spawns the eviction task on the current runtime.
pub fn spawn_sweeper(
    controller: Arc<AdmissionController>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = controller.sweep();
                    tracing::trace!(evicted, tracked = controller.tracked_clients(), "admission sweep");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("admission sweeper stopped");
    })
}
