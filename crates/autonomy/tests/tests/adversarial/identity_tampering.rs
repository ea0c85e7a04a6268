//! Adversarial test: identity state cannot be changed behind the policy.
//!
//! Editing a sealed identity in place, setting kernel-managed fields,
//! hiding behind placeholder actors or approving one's own high-risk change
//! must all be caught.

use maple_autonomy_drift::{DriftSeverity, PersonaDriftMonitor};
use maple_autonomy_identity::{
    evaluate_identity_update, AutonomyIdentityConfig, IdentityError, IdentityManager,
    IdentityPatch, IdentityUpdateContext, Tone,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn identity() -> AutonomyIdentityConfig {
    AutonomyIdentityConfig::new("Milo")
        .with_core_values(["honesty", "privacy"])
        .with_hard_boundaries(["Never share private user data"])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn in_place_edit_is_critical_drift() {
    let mut tampered = identity();
    tampered.hard_boundaries.clear();

    let mut monitor = PersonaDriftMonitor::default();
    monitor.record_output("Happy to help with that.");
    let report = monitor.analyze(&tampered);

    assert!(report.integrity_violation);
    assert_eq!(report.severity, DriftSeverity::Critical);
    assert_eq!(report.drift_score, 1.0);
}

#[test]
fn manager_refuses_tampered_identity() {
    let mut tampered = identity();
    tampered.core_values.push("obedience".into());
    assert!(matches!(
        IdentityManager::new(tampered),
        Err(IdentityError::IntegrityMismatch { .. })
    ));
}

#[test]
fn kernel_managed_fields_are_refused_even_from_system() {
    let mut patch = IdentityPatch::new().tone(Tone::Formal);
    patch.identity_version = Some(99);
    patch.identity_hash = Some("0".repeat(64));

    let decision = evaluate_identity_update(&identity(), &patch, &IdentityUpdateContext::system());
    assert!(!decision.allowed);
    assert!(decision
        .violations
        .iter()
        .any(|v| v.contains("kernel-managed")));

    let mut manager = IdentityManager::new(identity()).unwrap();
    let outcome = manager.update(&patch, &IdentityUpdateContext::system()).unwrap();
    assert!(!outcome.is_applied());
    assert_eq!(manager.version(), 1);
}

#[test]
fn placeholder_actors_are_refused() {
    let patch = IdentityPatch::new().tone(Tone::Formal);
    for actor in ["anonymous", "  ", "Admin", "unknown", "api"] {
        let decision =
            evaluate_identity_update(&identity(), &patch, &IdentityUpdateContext::api(actor));
        assert!(!decision.allowed, "actor {actor:?} was accepted");
    }
    let decision = evaluate_identity_update(&identity(), &patch, &IdentityUpdateContext::cli("dana"));
    assert!(decision.allowed);
}

#[test]
fn self_or_placeholder_approval_is_refused() {
    let patch = IdentityPatch::new().hard_boundaries(Vec::<String>::new());
    for approver in ["ALICE", "unknown", "anonymous"] {
        let context = IdentityUpdateContext::api("alice")
            .approved_by(approver)
            .reason("cleanup");
        let decision = evaluate_identity_update(&identity(), &patch, &context);
        assert!(!decision.allowed, "approver {approver:?} was accepted");
        assert!(decision.approval_required);
    }
}
