use thiserror::Error;

/// Errors from drift monitor configuration.
#[derive(Error, Debug)]
pub enum DriftError {
    #[error("invalid drift configuration: {0}")]
    InvalidConfig(String),
}
