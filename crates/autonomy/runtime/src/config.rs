//! Governance configuration, loaded once from TOML.
//!
//! ```toml
//! [trust]
//! write_threshold = 0.7
//! quarantine_threshold = 0.35
//! history_window = 100
//! max_content_chars = 10000
//!
//! [priors]
//! system = 0.9
//! user = 0.6
//! external = 0.3
//!
//! [drift]
//! analysis_window_size = 20
//! alert_threshold = 0.15
//! correction_threshold = 0.3
//!
//! [quarantine]
//! expiry_hours = 24
//!
//! [store]
//! timeout_ms = 5000
//! ```
//!
//! Every section and key is optional. Invalid values are never coerced:
//! [`GovernanceConfig::issues`] lists them and
//! [`GovernanceConfig::validated`] refuses the whole config.

use std::path::Path;
use std::time::Duration;

use maple_autonomy_drift::DriftConfig;
use maple_autonomy_trust::{GateThresholds, SourceKind, TrustScorerConfig};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

/// One year.
pub const MAX_EXPIRY_HOURS: u64 = 24 * 365;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigIssue {
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustSection {
    pub write_threshold: f64,
    pub quarantine_threshold: f64,
    pub history_window: usize,
    pub max_content_chars: usize,
}

impl Default for TrustSection {
    fn default() -> Self {
        let thresholds = GateThresholds::default();
        let scorer = TrustScorerConfig::default();
        Self {
            write_threshold: thresholds.write_threshold,
            quarantine_threshold: thresholds.quarantine_threshold,
            history_window: scorer.history_window,
            max_content_chars: scorer.max_content_chars,
        }
    }
}

/// Static reliability prior per source kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePriors {
    pub system: f64,
    pub user: f64,
    pub external: f64,
}

impl Default for SourcePriors {
    fn default() -> Self {
        Self {
            system: 0.9,
            user: 0.6,
            external: 0.3,
        }
    }
}

impl SourcePriors {
    pub fn for_kind(&self, kind: SourceKind) -> f64 {
        match kind {
            SourceKind::System => self.system,
            SourceKind::User => self.user,
            SourceKind::External => self.external,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftSection {
    pub analysis_window_size: usize,
    pub alert_threshold: f64,
    pub correction_threshold: f64,
}

impl Default for DriftSection {
    fn default() -> Self {
        let drift = DriftConfig::default();
        Self {
            analysis_window_size: drift.analysis_window_size,
            alert_threshold: drift.alert_threshold,
            correction_threshold: drift.correction_threshold,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarantineSection {
    pub expiry_hours: u64,
}

impl Default for QuarantineSection {
    fn default() -> Self {
        Self { expiry_hours: 24 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub timeout_ms: u64,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self { timeout_ms: 5_000 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    pub trust: TrustSection,
    pub priors: SourcePriors,
    pub drift: DriftSection,
    pub quarantine: QuarantineSection,
    pub store: StoreSection,
}

impl GovernanceConfig {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Governance config not found, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Every invalid value, in section order.
    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let unit = |v: f64| (0.0..=1.0).contains(&v);

        let t = &self.trust;
        if !unit(t.write_threshold) {
            issues.push(ConfigIssue::new("trust.write_threshold", "must lie in [0, 1]"));
        }
        if !unit(t.quarantine_threshold) {
            issues.push(ConfigIssue::new("trust.quarantine_threshold", "must lie in [0, 1]"));
        }
        if unit(t.write_threshold)
            && unit(t.quarantine_threshold)
            && t.quarantine_threshold >= t.write_threshold
        {
            issues.push(ConfigIssue::new(
                "trust.quarantine_threshold",
                "must be below trust.write_threshold",
            ));
        }
        if t.history_window == 0 {
            issues.push(ConfigIssue::new("trust.history_window", "must be positive"));
        }
        if t.max_content_chars == 0 {
            issues.push(ConfigIssue::new("trust.max_content_chars", "must be positive"));
        }

        for (field, value) in [
            ("priors.system", self.priors.system),
            ("priors.user", self.priors.user),
            ("priors.external", self.priors.external),
        ] {
            if !unit(value) {
                issues.push(ConfigIssue::new(field, "must lie in [0, 1]"));
            }
        }

        if let Err(e) = self.drift_config().validate() {
            issues.push(ConfigIssue::new("drift", e.to_string()));
        }

        if !(1..=MAX_EXPIRY_HOURS).contains(&self.quarantine.expiry_hours) {
            issues.push(ConfigIssue::new(
                "quarantine.expiry_hours",
                format!("must lie in 1..={MAX_EXPIRY_HOURS}"),
            ));
        }
        if self.store.timeout_ms == 0 {
            issues.push(ConfigIssue::new("store.timeout_ms", "must be positive"));
        }
        issues
    }

    /// `self` when there are no issues.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let issues = self.issues();
        if issues.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(issues))
        }
    }

    pub fn gate_thresholds(&self) -> GateThresholds {
        GateThresholds {
            write_threshold: self.trust.write_threshold,
            quarantine_threshold: self.trust.quarantine_threshold,
        }
    }

    pub fn scorer_config(&self) -> TrustScorerConfig {
        TrustScorerConfig {
            history_window: self.trust.history_window,
            max_content_chars: self.trust.max_content_chars,
            ..TrustScorerConfig::default()
        }
    }

    pub fn drift_config(&self) -> DriftConfig {
        DriftConfig {
            analysis_window_size: self.drift.analysis_window_size,
            alert_threshold: self.drift.alert_threshold,
            correction_threshold: self.drift.correction_threshold,
        }
    }

    pub fn quarantine_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.quarantine.expiry_hours.min(MAX_EXPIRY_HOURS) as i64)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store.timeout_ms)
    }
}
