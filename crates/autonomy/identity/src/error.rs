use thiserror::Error;

/// Errors from identity handling.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("identity integrity check failed: stored hash {stored}, recomputed {recomputed}")]
    IntegrityMismatch { stored: String, recomputed: String },

    #[error("identity is not sealed (missing identity hash)")]
    Unsealed,

    #[error("invalid identity: {0}")]
    Invalid(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
