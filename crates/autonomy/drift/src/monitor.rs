use maple_autonomy_identity::AutonomyIdentityConfig;
use tracing::{debug, error, warn};

use crate::analysis::analyze_outputs;
use crate::config::DriftConfig;
use crate::error::DriftError;
use crate::types::{DriftReport, DriftSeverity};
use crate::window::{OutputWindow, MAX_WINDOW};

/// Drift monitor for one agent session.
///
/// Owns a bounded [`OutputWindow`]; nothing is shared between instances.
#[derive(Clone, Debug)]
pub struct PersonaDriftMonitor {
    config: DriftConfig,
    window: OutputWindow,
}

impl PersonaDriftMonitor {
    pub fn new(config: DriftConfig) -> Result<Self, DriftError> {
        config.validate()?;
        Ok(Self {
            config,
            window: OutputWindow::new(MAX_WINDOW),
        })
    }

    pub fn config(&self) -> &DriftConfig {
        &self.config
    }

    pub fn window(&self) -> &OutputWindow {
        &self.window
    }

    /// Append one agent-authored output.
    pub fn record_output(&mut self, output: impl Into<String>) {
        self.window.push(output);
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }

    /// Analyse the session window against `identity`.
    pub fn analyze(&self, identity: &AutonomyIdentityConfig) -> DriftReport {
        let outputs = self.window.recent(self.config.analysis_window_size);
        self.analyze_outputs(outputs.as_slice(), identity)
    }

    /// Analyse an explicit list of outputs, bypassing the session window.
    pub fn analyze_outputs<S: AsRef<str>>(
        &self,
        outputs: &[S],
        identity: &AutonomyIdentityConfig,
    ) -> DriftReport {
        let report = analyze_outputs(outputs, identity, &self.config);
        log_report(&report, identity);
        report
    }
}

impl Default for PersonaDriftMonitor {
    fn default() -> Self {
        Self {
            config: DriftConfig::default(),
            window: OutputWindow::new(MAX_WINDOW),
        }
    }
}

fn log_report(report: &DriftReport, identity: &AutonomyIdentityConfig) {
    if report.integrity_violation {
        error!(
            identity = %identity.name,
            version = identity.identity_version,
            "Identity integrity violation: stored hash does not match content"
        );
        return;
    }
    match report.severity {
        DriftSeverity::High | DriftSeverity::Critical => warn!(
            identity = %identity.name,
            drift_score = report.drift_score,
            severity = %report.severity,
            "Persona drift detected"
        ),
        _ => debug!(
            identity = %identity.name,
            drift_score = report.drift_score,
            severity = %report.severity,
            "Persona drift analysed"
        ),
    }
}
