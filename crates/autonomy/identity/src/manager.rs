use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::diff::apply_patch;
use crate::error::IdentityError;
use crate::hash::verify_identity_hash;
use crate::policy::{
    evaluate_identity_update, IdentityUpdateContext, IdentityUpdatePolicyDecision, UpdateSource,
};
use crate::types::{AutonomyIdentityConfig, IdentityPatch};

const DEFAULT_HISTORY: usize = 32;

/// One accepted identity mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRevision {
    pub version: u64,
    pub hash: String,
    pub changed_fields: Vec<String>,
    pub actor: String,
    pub source: UpdateSource,
    pub approved_by: Option<String>,
    pub reason: Option<String>,
    pub applied_at: DateTime<Utc>,
}

/// Result of [`IdentityManager::update`].
#[derive(Clone, Debug, PartialEq)]
pub enum IdentityUpdateOutcome {
    /// Patch applied; identity is now at `revision.version`.
    Applied {
        decision: IdentityUpdatePolicyDecision,
        revision: IdentityRevision,
    },
    /// Policy allowed it but nothing differs.
    Unchanged(IdentityUpdatePolicyDecision),
    Rejected(IdentityUpdatePolicyDecision),
}

impl IdentityUpdateOutcome {
    pub fn decision(&self) -> &IdentityUpdatePolicyDecision {
        match self {
            Self::Applied { decision, .. } => decision,
            Self::Unchanged(decision) | Self::Rejected(decision) => decision,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Owns the live identity of one agent.
///
/// All mutation goes through [`update`](Self::update), which runs the
/// update policy, bumps `identity_version` and re-seals `identity_hash`.
#[derive(Debug)]
pub struct IdentityManager {
    identity: AutonomyIdentityConfig,
    history: VecDeque<IdentityRevision>,
    max_history: usize,
}

impl IdentityManager {
    /// Take ownership of an identity. Unsealed identities are sealed; a
    /// sealed identity whose hash does not match is refused.
    pub fn new(identity: AutonomyIdentityConfig) -> Result<Self, IdentityError> {
        identity.validate()?;
        let identity = if identity.identity_hash.is_empty() {
            identity.sealed()
        } else {
            verify_identity_hash(&identity)?;
            identity
        };
        Ok(Self {
            identity,
            history: VecDeque::new(),
            max_history: DEFAULT_HISTORY,
        })
    }

    pub fn with_max_history(mut self, max: usize) -> Self {
        self.max_history = max.max(1);
        self
    }

    pub fn identity(&self) -> &AutonomyIdentityConfig {
        &self.identity
    }

    pub fn version(&self) -> u64 {
        self.identity.identity_version
    }

    /// Most recent revisions, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &IdentityRevision> {
        self.history.iter()
    }

    pub fn verify_integrity(&self) -> Result<(), IdentityError> {
        verify_identity_hash(&self.identity)
    }

    /// Evaluate without applying.
    pub fn preview(
        &self,
        patch: &IdentityPatch,
        context: &IdentityUpdateContext,
    ) -> IdentityUpdatePolicyDecision {
        evaluate_identity_update(&self.identity, patch, context)
    }

    /// Evaluate and, if allowed, apply a patch.
    ///
    /// Fails only when the live identity no longer matches its hash; policy
    /// refusals come back as [`IdentityUpdateOutcome::Rejected`].
    pub fn update(
        &mut self,
        patch: &IdentityPatch,
        context: &IdentityUpdateContext,
    ) -> Result<IdentityUpdateOutcome, IdentityError> {
        self.verify_integrity()?;

        let decision = evaluate_identity_update(&self.identity, patch, context);
        if !decision.allowed {
            warn!(
                source = %decision.source,
                actor = %decision.actor,
                violations = ?decision.violations,
                "Identity update rejected"
            );
            return Ok(IdentityUpdateOutcome::Rejected(decision));
        }
        if decision.changed_fields.is_empty() {
            return Ok(IdentityUpdateOutcome::Unchanged(decision));
        }

        let mut next = apply_patch(&self.identity, patch);
        next.validate()?;
        next.identity_version = self.identity.identity_version + 1;
        let next = next.sealed();

        let revision = IdentityRevision {
            version: next.identity_version,
            hash: next.identity_hash.clone(),
            changed_fields: decision.changed_fields.clone(),
            actor: decision.actor.clone(),
            source: decision.source,
            approved_by: decision.approved_by.clone(),
            reason: decision.reason.clone(),
            applied_at: Utc::now(),
        };

        info!(
            version = revision.version,
            actor = %revision.actor,
            fields = ?revision.changed_fields,
            "Identity updated"
        );

        self.identity = next;
        if self.history.len() == self.max_history {
            self.history.pop_front();
        }
        self.history.push_back(revision.clone());

        Ok(IdentityUpdateOutcome::Applied { decision, revision })
    }
}
