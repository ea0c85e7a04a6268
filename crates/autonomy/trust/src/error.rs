use thiserror::Error;

/// Errors from trust scoring and gating configuration.
#[derive(Error, Debug)]
pub enum TrustError {
    #[error(
        "invalid gate thresholds: quarantine {quarantine} must be below write {write}, both within [0, 1]"
    )]
    InvalidThresholds { write: f64, quarantine: f64 },

    #[error("invalid scorer configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid rule pattern '{label}': {source}")]
    InvalidPattern {
        label: String,
        #[source]
        source: regex::Error,
    },
}
