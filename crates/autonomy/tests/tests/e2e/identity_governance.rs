//! End-to-end test: identity updates through the policy and the manager.
//!
//! Low-risk style changes go through for any named actor; changes to core
//! values or hard boundaries need a second person and a reason.

use maple_autonomy_identity::{
    evaluate_identity_update, AutonomyIdentityConfig, IdentityManager, IdentityPatch,
    IdentityUpdateContext, IdentityUpdateOutcome, Tone, UpdateRisk, UpdateSource,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn manager() -> IdentityManager {
    IdentityManager::new(
        AutonomyIdentityConfig::new("Milo")
            .with_core_values(["honesty", "helpfulness"])
            .with_hard_boundaries(["Never share private user data"]),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn tone_change_from_api_needs_no_approval() {
    let mut m = manager();
    let outcome = m
        .update(
            &IdentityPatch::new().tone(Tone::Technical),
            &IdentityUpdateContext::api("alice"),
        )
        .unwrap();

    let decision = outcome.decision();
    assert!(decision.allowed);
    assert!(!decision.approval_required);
    assert_eq!(decision.risk, UpdateRisk::Low);
    assert!(outcome.is_applied());
    assert_eq!(m.identity().communication_style.tone, Tone::Technical);
    assert!(m.verify_integrity().is_ok());
}

#[test]
fn core_values_change_needs_distinct_approver_and_reason() {
    let mut m = manager();
    let patch = IdentityPatch::new().core_values(["honesty", "helpfulness", "curiosity"]);

    let outcome = m.update(&patch, &IdentityUpdateContext::api("alice")).unwrap();
    assert!(matches!(outcome, IdentityUpdateOutcome::Rejected(_)));
    assert_eq!(m.version(), 1);

    let self_approved = m
        .preview(
            &patch,
            &IdentityUpdateContext::api("alice")
                .approved_by("Alice")
                .reason("expanding scope"),
        );
    assert!(!self_approved.allowed);
    assert!(self_approved
        .violations
        .iter()
        .any(|v| v.contains("differ from actor")));

    let no_reason = m.preview(&patch, &IdentityUpdateContext::api("alice").approved_by("bob"));
    assert!(!no_reason.allowed);

    let outcome = m
        .update(
            &patch,
            &IdentityUpdateContext::api("alice")
                .approved_by("bob")
                .reason("expanding scope"),
        )
        .unwrap();
    assert!(outcome.is_applied());
    assert_eq!(outcome.decision().risk, UpdateRisk::High);
    assert_eq!(outcome.decision().changed_fields, vec!["coreValues"]);
    assert_eq!(m.version(), 2);

    let revision = m.history().last().unwrap();
    assert_eq!(revision.actor, "alice");
    assert_eq!(revision.approved_by.as_deref(), Some("bob"));
}

#[test]
fn system_source_bypasses_external_approval() {
    let m = manager();
    let decision = evaluate_identity_update(
        m.identity(),
        &IdentityPatch::new().hard_boundaries(["Never share private user data", "Never spend money"]),
        &IdentityUpdateContext::system(),
    );
    assert!(decision.allowed);
    assert!(!decision.approval_required);
    assert_eq!(decision.risk, UpdateRisk::High);
    assert_eq!(decision.source, UpdateSource::System);
    assert_eq!(decision.actor, "system");
}
