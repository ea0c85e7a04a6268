use std::sync::Arc;

use maple_autonomy_drift::{DriftReport, DriftSeverity, PersonaDriftMonitor};
use maple_autonomy_identity::AutonomyIdentityConfig;

use crate::config::GovernanceConfig;
use crate::error::ServiceError;
use crate::events::{emit_best_effort, EventSink, GovernanceEvent};

/// Drift monitoring for one agent session.
///
/// Reports at `medium` severity or worse, and every integrity violation,
/// are emitted as `identity:drift`.
pub struct DriftSession {
    session_id: String,
    monitor: PersonaDriftMonitor,
    events: Arc<dyn EventSink>,
}

impl DriftSession {
    pub fn new(
        session_id: impl Into<String>,
        config: &GovernanceConfig,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            session_id: session_id.into(),
            monitor: PersonaDriftMonitor::new(config.drift_config())?,
            events,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn monitor(&self) -> &PersonaDriftMonitor {
        &self.monitor
    }

    pub fn record_output(&mut self, output: impl Into<String>) {
        self.monitor.record_output(output);
    }

    pub fn analyze(&self, identity: &AutonomyIdentityConfig) -> DriftReport {
        let report = self.monitor.analyze(identity);
        if report.integrity_violation || report.severity >= DriftSeverity::Medium {
            emit_best_effort(
                self.events.as_ref(),
                GovernanceEvent::IdentityDrift {
                    session_id: self.session_id.clone(),
                    report: report.clone(),
                },
            );
        }
        report
    }

    /// Clear the window, e.g. after a context reset.
    pub fn reset(&mut self) {
        self.monitor.reset();
    }
}
