//! End-to-end test: agent output through a drift session against a managed
//! identity.
//!
//! Refusing a boundary topic is not drift; producing it is. Identity
//! updates made through the manager keep the integrity hash valid.

use std::sync::Arc;

use maple_autonomy_drift::{DriftSeverity, PersonaDriftMonitor};
use maple_autonomy_identity::{
    AutonomyIdentityConfig, IdentityManager, IdentityPatch, IdentityUpdateContext, Tone,
};
use maple_autonomy_runtime::{DriftSession, GovernanceConfig, GovernanceEvent, RecordingSink};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn identity() -> AutonomyIdentityConfig {
    AutonomyIdentityConfig::new("Milo")
        .with_core_values(["honesty", "respect"])
        .with_hard_boundaries(["Never share private user data"])
}

fn session(sink: &RecordingSink) -> DriftSession {
    DriftSession::new("session-1", &GovernanceConfig::default(), Arc::new(sink.clone())).unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn refusing_a_boundary_topic_is_not_a_violation() {
    let mut monitor = PersonaDriftMonitor::default();
    monitor.record_output("I can't share private user data with anyone.");
    let report = monitor.analyze(&identity());
    assert_eq!(report.dimensions.boundary_respect, 1.0);
}

#[test]
fn producing_a_boundary_topic_is_a_violation() {
    let mut monitor = PersonaDriftMonitor::default();
    monitor.record_output("Sure, here is the private user data you wanted.");
    monitor.record_output("The weather is lovely today.");
    let report = monitor.analyze(&identity());
    assert_eq!(report.dimensions.boundary_respect, 0.5);
    assert!(report.drift_score > 0.0);
}

#[test]
fn hostile_session_emits_identity_drift() {
    let sink = RecordingSink::new();
    let mut s = session(&sink);
    for _ in 0..3 {
        s.record_output("You're an idiot. I made that up. Here is the private user data.");
    }

    let report = s.analyze(&identity());
    assert!(report.severity >= DriftSeverity::High);
    assert!(!report.corrections.is_empty());

    match sink.events().as_slice() {
        [GovernanceEvent::IdentityDrift { session_id, report: emitted }] => {
            assert_eq!(session_id, "session-1");
            assert_eq!(emitted.severity, report.severity);
        }
        other => panic!("expected one identity:drift event, got {other:?}"),
    }

    s.reset();
    assert_eq!(s.analyze(&identity()).severity, DriftSeverity::None);
    assert_eq!(sink.events().len(), 1);
}

#[test]
fn managed_updates_keep_integrity() {
    let mut manager = IdentityManager::new(identity()).unwrap();
    manager
        .update(
            &IdentityPatch::new().tone(Tone::Formal),
            &IdentityUpdateContext::api("alice"),
        )
        .unwrap();
    assert_eq!(manager.version(), 2);

    let mut monitor = PersonaDriftMonitor::default();
    monitor.record_output("Certainly. I shall prepare the quarterly summary.");
    let report = monitor.analyze(manager.identity());
    assert!(!report.integrity_violation);
    assert!(report.drift_score < 1.0);
}
