//! Content-derived integrity hash for [`AutonomyIdentityConfig`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::IdentityError;
use crate::types::{AutonomyIdentityConfig, CommunicationStyle};

/// Everything except `identity_hash`, in a fixed field order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HashView<'a> {
    name: &'a str,
    core_values: &'a [String],
    communication_style: &'a CommunicationStyle,
    hard_boundaries: &'a [String],
    soft_preferences: &'a BTreeMap<String, serde_json::Value>,
    identity_version: u64,
}

/// BLAKE3 hex digest over the canonical JSON of the identity, excluding
/// the stored hash itself.
pub fn compute_identity_hash(identity: &AutonomyIdentityConfig) -> String {
    let view = HashView {
        name: &identity.name,
        core_values: &identity.core_values,
        communication_style: &identity.communication_style,
        hard_boundaries: &identity.hard_boundaries,
        soft_preferences: &identity.soft_preferences,
        identity_version: identity.identity_version,
    };
    let bytes = serde_json::to_vec(&view).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}

/// Check the stored hash against a fresh computation.
pub fn verify_identity_hash(identity: &AutonomyIdentityConfig) -> Result<(), IdentityError> {
    if identity.identity_hash.is_empty() {
        return Err(IdentityError::Unsealed);
    }
    let recomputed = compute_identity_hash(identity);
    if recomputed != identity.identity_hash {
        return Err(IdentityError::IntegrityMismatch {
            stored: identity.identity_hash.clone(),
            recomputed,
        });
    }
    Ok(())
}
