//! Identity update governance.
//!
//! A pure decision over `(current, patch, context)`. The caller applies the
//! patch only when the decision is `allowed`.

use serde::{Deserialize, Serialize};

use crate::diff::identity_changed_fields;
use crate::types::{AutonomyIdentityConfig, IdentityPatch};

/// Fields whose mutation needs a second, distinct approver.
pub const HIGH_RISK_FIELDS: &[&str] = &["name", "coreValues", "hardBoundaries"];

/// Fields only the kernel may write.
pub const KERNEL_MANAGED_FIELDS: &[&str] = &["identityVersion", "identityHash"];

/// Actor names that do not identify anyone.
const PLACEHOLDER_ACTORS: &[&str] = &[
    "", "unknown", "anonymous", "anon", "none", "null", "n/a", "user", "system", "api", "cli",
    "admin",
];

/// Where an identity update originates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateSource {
    /// The hosting runtime itself. Trusted; no external approval.
    System,
    Api,
    Cli,
}

impl std::fmt::Display for UpdateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Api => write!(f, "api"),
            Self::Cli => write!(f, "cli"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateRisk {
    Low,
    High,
}

/// Who is asking, through which surface, and with whose sign-off.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUpdateContext {
    pub source: UpdateSource,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl IdentityUpdateContext {
    pub fn system() -> Self {
        Self {
            source: UpdateSource::System,
            actor: None,
            approved_by: None,
            reason: None,
        }
    }

    pub fn api(actor: impl Into<String>) -> Self {
        Self {
            source: UpdateSource::Api,
            actor: Some(actor.into()),
            approved_by: None,
            reason: None,
        }
    }

    pub fn cli(actor: impl Into<String>) -> Self {
        Self {
            source: UpdateSource::Cli,
            actor: Some(actor.into()),
            approved_by: None,
            reason: None,
        }
    }

    pub fn approved_by(mut self, approver: impl Into<String>) -> Self {
        self.approved_by = Some(approver.into());
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUpdatePolicyDecision {
    pub allowed: bool,
    pub source: UpdateSource,
    pub actor: String,
    pub approved_by: Option<String>,
    pub reason: Option<String>,
    pub risk: UpdateRisk,
    pub approval_required: bool,
    pub changed_fields: Vec<String>,
    pub violations: Vec<String>,
}

fn is_placeholder(name: Option<&str>) -> bool {
    match name {
        None => true,
        Some(n) => {
            let n = n.trim().to_lowercase();
            PLACEHOLDER_ACTORS.contains(&n.as_str())
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Decide whether `patch` may be applied to `current`.
pub fn evaluate_identity_update(
    current: &AutonomyIdentityConfig,
    patch: &IdentityPatch,
    context: &IdentityUpdateContext,
) -> IdentityUpdatePolicyDecision {
    let changed_fields = identity_changed_fields(current, patch);
    let high_risk = changed_fields
        .iter()
        .any(|f| HIGH_RISK_FIELDS.contains(&f.as_str()));
    let risk = if high_risk { UpdateRisk::High } else { UpdateRisk::Low };
    let is_system = context.source == UpdateSource::System;

    let actor = match non_blank(&context.actor) {
        Some(actor) => actor,
        None if is_system => "system".to_string(),
        None => String::new(),
    };
    let approved_by = non_blank(&context.approved_by);
    let reason = non_blank(&context.reason);

    let mut violations = Vec::new();

    if patch.touches_kernel_managed() {
        violations.push(format!(
            "kernel-managed fields cannot be set directly: {}",
            KERNEL_MANAGED_FIELDS.join(", ")
        ));
    }

    let approval_required = high_risk && !is_system;

    if !is_system && is_placeholder(Some(&actor)) {
        violations.push(format!(
            "{} updates require a named actor (got '{}')",
            context.source, actor
        ));
        return IdentityUpdatePolicyDecision {
            allowed: false,
            source: context.source,
            actor,
            approved_by,
            reason,
            risk,
            approval_required,
            changed_fields,
            violations,
        };
    }

    if approval_required {
        match approved_by.as_deref() {
            Some(approver) if is_placeholder(Some(approver)) => {
                violations.push(format!("approvedBy '{approver}' is not a named approver"));
            }
            Some(approver) if approver.eq_ignore_ascii_case(&actor) => {
                violations.push("approvedBy must differ from actor".to_string());
            }
            Some(_) => {}
            None => {
                violations.push("high-risk change requires approvedBy".to_string());
            }
        }
        if reason.is_none() {
            violations.push("high-risk change requires a reason".to_string());
        }
    }

    IdentityUpdatePolicyDecision {
        allowed: violations.is_empty(),
        source: context.source,
        actor,
        approved_by,
        reason,
        risk,
        approval_required,
        changed_fields,
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tone;

    fn identity() -> AutonomyIdentityConfig {
        AutonomyIdentityConfig::new("Milo")
            .with_core_values(["honesty", "helpfulness"])
            .with_hard_boundaries(["Never share private user data"])
    }

    #[test]
    fn tone_change_from_named_api_actor_is_low_risk() {
        let patch = IdentityPatch::new().tone(Tone::Formal);
        let d = evaluate_identity_update(&identity(), &patch, &IdentityUpdateContext::api("alice"));
        assert!(d.allowed);
        assert!(!d.approval_required);
        assert_eq!(d.risk, UpdateRisk::Low);
        assert_eq!(d.changed_fields, vec!["communicationStyle.tone"]);
    }

    #[test]
    fn core_values_without_approval_rejected() {
        let patch = IdentityPatch::new().core_values(["obedience"]);
        let d = evaluate_identity_update(&identity(), &patch, &IdentityUpdateContext::api("alice"));
        assert!(!d.allowed);
        assert!(d.approval_required);
        assert_eq!(d.risk, UpdateRisk::High);
        assert_eq!(d.violations.len(), 2);
    }

    #[test]
    fn core_values_with_distinct_approver_and_reason_allowed() {
        let patch = IdentityPatch::new().core_values(["honesty", "humility"]);
        let ctx = IdentityUpdateContext::api("alice")
            .approved_by("bob")
            .reason("quarterly persona review");
        let d = evaluate_identity_update(&identity(), &patch, &ctx);
        assert!(d.allowed, "{:?}", d.violations);
        assert!(d.approval_required);
    }

    #[test]
    fn self_approval_rejected_case_insensitive() {
        let patch = IdentityPatch::new().name("Nova");
        let ctx = IdentityUpdateContext::cli("Alice").approved_by("alice").reason("rename");
        let d = evaluate_identity_update(&identity(), &patch, &ctx);
        assert!(!d.allowed);
        assert!(d.violations.iter().any(|v| v.contains("differ")));
    }

    #[test]
    fn placeholder_approver_rejected() {
        let patch = IdentityPatch::new().hard_boundaries(["Never lie"]);
        let ctx = IdentityUpdateContext::api("alice").approved_by("admin").reason("tighten");
        let d = evaluate_identity_update(&identity(), &patch, &ctx);
        assert!(!d.allowed);
    }

    #[test]
    fn placeholder_actor_rejected_outright() {
        for actor in ["", "  ", "anonymous", "N/A", "Admin", "user"] {
            let patch = IdentityPatch::new().tone(Tone::Formal);
            let d = evaluate_identity_update(&identity(), &patch, &IdentityUpdateContext::api(actor));
            assert!(!d.allowed, "actor {actor:?} should be rejected");
            assert_eq!(d.violations.len(), 1);
        }
    }

    #[test]
    fn system_bypasses_approval() {
        let patch = IdentityPatch::new().core_values(["safety"]);
        let d = evaluate_identity_update(&identity(), &patch, &IdentityUpdateContext::system());
        assert!(d.allowed);
        assert!(!d.approval_required);
        assert_eq!(d.risk, UpdateRisk::High);
        assert_eq!(d.actor, "system");
    }

    #[test]
    fn kernel_managed_fields_refused_even_for_system() {
        let mut patch = IdentityPatch::new();
        patch.identity_version = Some(42);
        let d = evaluate_identity_update(&identity(), &patch, &IdentityUpdateContext::system());
        assert!(!d.allowed);
        assert!(d.violations[0].contains("kernel-managed"));
    }

    #[test]
    fn empty_diff_allowed() {
        let d = evaluate_identity_update(
            &identity(),
            &IdentityPatch::new(),
            &IdentityUpdateContext::api("alice"),
        );
        assert!(d.allowed);
        assert!(d.changed_fields.is_empty());
    }
}
