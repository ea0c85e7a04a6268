use maple_autonomy_drift::DriftError;
use maple_autonomy_trust::TrustError;
use thiserror::Error;

use crate::config::ConfigIssue;
use crate::store::QuarantineStatus;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration has {} issue(s): {}", .0.len(), summarize(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn summarize(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.field, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EventError {
    #[error("No subscribers for event {0}")]
    NoSubscribers(&'static str),

    #[error("Event sink closed")]
    Closed,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Memory store unavailable: {0}")]
    Unavailable(String),

    #[error("Quarantine record not found: {0}")]
    NotFound(String),

    #[error("Quarantine record {id} already {status}")]
    AlreadyResolved { id: String, status: QuarantineStatus },

    #[error("Store operation {operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Trust error: {0}")]
    Trust(#[from] TrustError),

    #[error("Drift error: {0}")]
    Drift(#[from] DriftError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
