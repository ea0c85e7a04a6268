//! Patch application and changed-field computation.

use std::collections::BTreeSet;

use crate::types::{AutonomyIdentityConfig, IdentityPatch};

/// Apply a patch to a copy of `current`. Soft preferences merge key by key.
///
/// Kernel-managed fields in the patch are applied verbatim so the diff can
/// see them; the policy is what refuses them.
pub fn apply_patch(current: &AutonomyIdentityConfig, patch: &IdentityPatch) -> AutonomyIdentityConfig {
    let mut next = current.clone();

    if let Some(name) = &patch.name {
        next.name = name.clone();
    }
    if let Some(values) = &patch.core_values {
        next.core_values = values.clone();
    }
    if let Some(style) = &patch.communication_style {
        if let Some(tone) = style.tone {
            next.communication_style.tone = tone;
        }
        if let Some(verbosity) = style.verbosity {
            next.communication_style.verbosity = verbosity;
        }
        if let Some(voice) = &style.persona_voice {
            next.communication_style.persona_voice = voice.clone();
        }
    }
    if let Some(boundaries) = &patch.hard_boundaries {
        next.hard_boundaries = boundaries.clone();
    }
    if let Some(prefs) = &patch.soft_preferences {
        for (key, value) in prefs {
            next.soft_preferences.insert(key.clone(), value.clone());
        }
    }
    if let Some(version) = patch.identity_version {
        next.identity_version = version;
    }
    if let Some(hash) = &patch.identity_hash {
        next.identity_hash = hash.clone();
    }

    next
}

/// Dotted paths whose values differ between two identities, sorted.
pub fn diff_identities(a: &AutonomyIdentityConfig, b: &AutonomyIdentityConfig) -> Vec<String> {
    let mut changed = BTreeSet::new();

    if a.name != b.name {
        changed.insert("name".to_string());
    }
    if a.core_values != b.core_values {
        changed.insert("coreValues".to_string());
    }
    if a.communication_style.tone != b.communication_style.tone {
        changed.insert("communicationStyle.tone".to_string());
    }
    if a.communication_style.verbosity != b.communication_style.verbosity {
        changed.insert("communicationStyle.verbosity".to_string());
    }
    if a.communication_style.persona_voice != b.communication_style.persona_voice {
        changed.insert("communicationStyle.personaVoice".to_string());
    }
    if a.hard_boundaries != b.hard_boundaries {
        changed.insert("hardBoundaries".to_string());
    }
    let keys: BTreeSet<&String> = a
        .soft_preferences
        .keys()
        .chain(b.soft_preferences.keys())
        .collect();
    for key in keys {
        if a.soft_preferences.get(key) != b.soft_preferences.get(key) {
            changed.insert(format!("softPreferences.{key}"));
        }
    }
    if a.identity_version != b.identity_version {
        changed.insert("identityVersion".to_string());
    }
    if a.identity_hash != b.identity_hash {
        changed.insert("identityHash".to_string());
    }

    changed.into_iter().collect()
}

/// Fields that would change if `patch` were applied to `current`.
pub fn identity_changed_fields(current: &AutonomyIdentityConfig, patch: &IdentityPatch) -> Vec<String> {
    diff_identities(current, &apply_patch(current, patch))
}
