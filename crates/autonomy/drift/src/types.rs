use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftSeverity {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl DriftSeverity {
    /// Bucket a drift score: `< 0.05` none, `< alert` low, `< correction`
    /// medium, `< 0.5` high, otherwise critical.
    pub fn from_score(score: f64, alert_threshold: f64, correction_threshold: f64) -> Self {
        if score < 0.05 {
            Self::None
        } else if score < alert_threshold {
            Self::Low
        } else if score < correction_threshold {
            Self::Medium
        } else if score < 0.5 {
            Self::High
        } else {
            Self::Critical
        }
    }
}

impl std::fmt::Display for DriftSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftDimensions {
    pub value_alignment: f64,
    pub style_consistency: f64,
    pub boundary_respect: f64,
    pub topic_focus: f64,
}

impl DriftDimensions {
    pub fn aligned() -> Self {
        Self {
            value_alignment: 1.0,
            style_consistency: 1.0,
            boundary_respect: 1.0,
            topic_focus: 1.0,
        }
    }

    /// Weighted drift, clamped to `[0, 1]`.
    pub fn drift_score(&self) -> f64 {
        let raw = 0.3 * (1.0 - self.value_alignment)
            + 0.25 * (1.0 - self.style_consistency)
            + 0.3 * (1.0 - self.boundary_respect)
            + 0.15 * (1.0 - self.topic_focus);
        raw.clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    pub drift_score: f64,
    pub dimensions: DriftDimensions,
    pub window_size: usize,
    pub severity: DriftSeverity,
    pub corrections: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
    /// The identity hash did not match its content.
    pub integrity_violation: bool,
}
