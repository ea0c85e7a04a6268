#![deny(unsafe_code)]
//! # maple-autonomy-identity
//!
//! The declared identity of an autonomous agent and the rules governing how
//! it may change.
//!
//! - [`AutonomyIdentityConfig`]: name, core values, communication style,
//!   hard boundaries, soft preferences, plus the kernel-managed
//!   `identity_version` / `identity_hash` pair.
//! - [`compute_identity_hash`]: BLAKE3 integrity hash over the canonical
//!   identity content. A mismatch between the stored and recomputed hash
//!   signals tampering.
//! - [`evaluate_identity_update`]: pure policy deciding whether a proposed
//!   [`IdentityPatch`] is permitted and whether it needs external approval.
//! - [`IdentityManager`]: owns the live identity, applies permitted patches,
//!   bumps the version and re-seals the hash.

pub mod diff;
pub mod error;
pub mod hash;
pub mod manager;
pub mod policy;
pub mod types;

pub use diff::{apply_patch, diff_identities, identity_changed_fields};
pub use error::IdentityError;
pub use hash::{compute_identity_hash, verify_identity_hash};
pub use manager::{IdentityManager, IdentityRevision, IdentityUpdateOutcome};
pub use policy::{
    evaluate_identity_update, IdentityUpdateContext, IdentityUpdatePolicyDecision, UpdateRisk,
    UpdateSource, HIGH_RISK_FIELDS, KERNEL_MANAGED_FIELDS,
};
pub use types::{
    AutonomyIdentityConfig, CommunicationStyle, CommunicationStylePatch, IdentityPatch, Tone,
    Verbosity,
};
