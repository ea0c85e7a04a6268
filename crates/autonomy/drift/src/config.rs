use serde::{Deserialize, Serialize};

use crate::error::DriftError;
use crate::window::MAX_WINDOW;

/// Drift monitor thresholds and window size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftConfig {
    /// Number of most recent outputs analysed. Capped at [`MAX_WINDOW`].
    pub analysis_window_size: usize,
    /// Drift at or above this is at least `medium`.
    pub alert_threshold: f64,
    /// Drift at or above this is at least `high` and gets generic remediation.
    pub correction_threshold: f64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            analysis_window_size: 20,
            alert_threshold: 0.15,
            correction_threshold: 0.3,
        }
    }
}

impl DriftConfig {
    pub fn validate(&self) -> Result<(), DriftError> {
        if self.analysis_window_size == 0 || self.analysis_window_size > MAX_WINDOW {
            return Err(DriftError::InvalidConfig(format!(
                "analysis window size must be within 1..={MAX_WINDOW} (got {})",
                self.analysis_window_size
            )));
        }
        let unit = |v: f64| v > 0.0 && v <= 1.0;
        if !unit(self.alert_threshold) || !unit(self.correction_threshold) {
            return Err(DriftError::InvalidConfig(
                "drift thresholds must lie in (0, 1]".into(),
            ));
        }
        if self.alert_threshold >= self.correction_threshold {
            return Err(DriftError::InvalidConfig(format!(
                "alert threshold {} must be below correction threshold {}",
                self.alert_threshold, self.correction_threshold
            )));
        }
        Ok(())
    }
}
