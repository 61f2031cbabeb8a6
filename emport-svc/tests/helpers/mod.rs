//! Test Helper Utilities
//!
//! Shared utilities for testing emport-svc

#![allow(dead_code)]

pub mod gated_store;

pub use gated_store::GatedStore;

use emport_svc::services::{ImportCoordinator, PollOutcome};
use emport_svc::models::TaskSnapshot;
use std::time::Duration;

/// Poll `owner` until a terminal snapshot arrives
///
/// Panics after ~5 seconds so a stuck worker fails the test instead of hanging it.
pub async fn wait_for_terminal(coordinator: &ImportCoordinator, owner: &str) -> TaskSnapshot {
    for _ in 0..500 {
        match coordinator.poll(owner) {
            PollOutcome::Task(snapshot) if snapshot.status.is_terminal() => return snapshot,
            PollOutcome::Task(_) => {}
            PollOutcome::NoImport => panic!("import for '{}' vanished before finishing", owner),
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("import for '{}' did not finish in time", owner);
}
