//! Property tests: identity diffs, risk tiering and re-sealing.

use maple_autonomy_identity::{
    apply_patch, evaluate_identity_update, identity_changed_fields, AutonomyIdentityConfig,
    IdentityManager, IdentityPatch, IdentityUpdateContext, Tone, UpdateRisk, Verbosity,
    HIGH_RISK_FIELDS,
};
use proptest::prelude::*;
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn base() -> AutonomyIdentityConfig {
    AutonomyIdentityConfig::new("Milo")
        .with_core_values(["honesty"])
        .with_hard_boundaries(["Never share private user data"])
        .with_soft_preference("emoji", json!(false))
}

fn arb_patch() -> impl Strategy<Value = IdentityPatch> {
    (
        prop::option::of(prop_oneof![Just("Milo"), Just("Nova")]),
        prop::option::of(prop::sample::select(Tone::ALL.to_vec())),
        prop::option::of(prop_oneof![
            Just(Verbosity::Concise),
            Just(Verbosity::Balanced),
            Just(Verbosity::Detailed),
        ]),
        prop::option::of(prop_oneof![
            Just(vec!["honesty"]),
            Just(vec!["honesty", "curiosity"]),
        ]),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(name, tone, verbosity, values, emoji)| {
            let mut patch = IdentityPatch::new();
            if let Some(name) = name {
                patch = patch.name(name);
            }
            if let Some(tone) = tone {
                patch = patch.tone(tone);
            }
            if let Some(verbosity) = verbosity {
                patch = patch.verbosity(verbosity);
            }
            if let Some(values) = values {
                patch = patch.core_values(values);
            }
            if let Some(emoji) = emoji {
                patch = patch.soft_preference("emoji", json!(emoji));
            }
            patch
        })
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// A patch reports changes exactly when applying it alters the identity.
    #[test]
    fn changed_fields_match_application(patch in arb_patch()) {
        let current = base();
        let changed = identity_changed_fields(&current, &patch);
        prop_assert_eq!(changed.is_empty(), apply_patch(&current, &patch) == current);

        let mut sorted = changed.clone();
        sorted.sort();
        prop_assert_eq!(&sorted, &changed);
    }

    /// Risk is high exactly when a high-risk field changes.
    #[test]
    fn risk_follows_changed_fields(patch in arb_patch()) {
        let decision = evaluate_identity_update(&base(), &patch, &IdentityUpdateContext::api("alice"));
        let high = decision
            .changed_fields
            .iter()
            .any(|f| HIGH_RISK_FIELDS.contains(&f.as_str()));
        prop_assert_eq!(decision.risk == UpdateRisk::High, high);
        prop_assert_eq!(decision.approval_required, high);
        prop_assert_eq!(decision.allowed, !high);
    }

    /// Approved updates bump the version by one and keep the hash valid.
    #[test]
    fn applied_updates_reseal(patch in arb_patch()) {
        let mut manager = IdentityManager::new(base()).unwrap();
        let before = manager.version();
        let context = IdentityUpdateContext::cli("alice")
            .approved_by("bob")
            .reason("property run");
        let outcome = manager.update(&patch, &context).unwrap();

        let expected = if outcome.is_applied() { before + 1 } else { before };
        prop_assert_eq!(manager.version(), expected);
        prop_assert!(manager.verify_integrity().is_ok());
        prop_assert_eq!(outcome.is_applied(), !outcome.decision().changed_fields.is_empty());
    }
}
