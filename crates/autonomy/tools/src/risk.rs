//! Permission-based risk tiering.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Blast radius of a tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskClass {
    ReadOnly,
    Reversible,
    Irreversible,
}

impl std::fmt::Display for RiskClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "read-only"),
            Self::Reversible => write!(f, "reversible"),
            Self::Irreversible => write!(f, "irreversible"),
        }
    }
}

/// Any of these forces [`RiskClass::Irreversible`].
pub const DANGEROUS_PERMISSIONS: &[&str] = &[
    "process:shell",
    "fs:write:any",
    "secrets:read",
    "secrets:write",
    "native:ffi",
    "env:write",
];

/// A permission with one of these `:`-separated segments can change state.
pub const WRITE_SEGMENTS: &[&str] = &["write", "delete", "spawn", "send", "outbound"];

#[derive(Clone, Debug)]
pub struct RiskClassifier {
    dangerous: BTreeSet<String>,
    write_segments: BTreeSet<String>,
}

impl RiskClassifier {
    pub fn new() -> Self {
        Self {
            dangerous: DANGEROUS_PERMISSIONS.iter().map(|p| p.to_string()).collect(),
            write_segments: WRITE_SEGMENTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Add a permission to the dangerous list.
    pub fn with_dangerous(mut self, permission: impl Into<String>) -> Self {
        self.dangerous.insert(permission.into().to_lowercase());
        self
    }

    pub fn is_dangerous(&self, permission: &str) -> bool {
        self.dangerous.contains(&permission.trim().to_lowercase())
    }

    pub fn is_write_capable(&self, permission: &str) -> bool {
        permission
            .trim()
            .to_lowercase()
            .split(':')
            .any(|segment| self.write_segments.contains(segment))
    }

    /// Dangerous beats write-capable beats read-only.
    pub fn classify<I, S>(&self, permissions: I) -> RiskClass
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut class = RiskClass::ReadOnly;
        for permission in permissions {
            let permission = permission.as_ref();
            if self.is_dangerous(permission) {
                return RiskClass::Irreversible;
            }
            if self.is_write_capable(permission) {
                class = RiskClass::Reversible;
            }
        }
        class
    }
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new()
    }
}
