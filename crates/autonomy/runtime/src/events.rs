//! Best-effort governance event emission.
//!
//! Emission failures are logged at `debug!` and dropped; they never change
//! a governing decision.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use maple_autonomy_drift::DriftReport;
use maple_autonomy_trust::{MemoryGateDecision, TrustScore};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::EventError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum GovernanceEvent {
    #[serde(rename = "trust:scored", rename_all = "camelCase")]
    TrustScored {
        message_id: String,
        source_id: String,
        trust: TrustScore,
    },
    #[serde(rename = "memory:gated", rename_all = "camelCase")]
    MemoryGated {
        message_id: String,
        source_id: String,
        decision: MemoryGateDecision,
        record_id: Option<String>,
        at: DateTime<Utc>,
    },
    #[serde(rename = "identity:drift", rename_all = "camelCase")]
    IdentityDrift {
        session_id: String,
        report: DriftReport,
    },
}

impl GovernanceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TrustScored { .. } => "trust:scored",
            Self::MemoryGated { .. } => "memory:gated",
            Self::IdentityDrift { .. } => "identity:drift",
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: GovernanceEvent) -> Result<(), EventError>;
}

/// Emit and swallow any failure.
pub fn emit_best_effort(sink: &dyn EventSink, event: GovernanceEvent) {
    let name = event.name();
    if let Err(e) = sink.emit(event) {
        debug!(event = name, error = %e, "Governance event dropped");
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: GovernanceEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// Fans events out to tokio broadcast subscribers.
#[derive(Clone, Debug)]
pub struct BroadcastSink {
    sender: broadcast::Sender<GovernanceEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GovernanceEvent> {
        self.sender.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: GovernanceEvent) -> Result<(), EventError> {
        let name = event.name();
        self.sender
            .send(event)
            .map(|_| ())
            .map_err(|_| EventError::NoSubscribers(name))
    }
}

/// Keeps every event in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<GovernanceEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GovernanceEvent> {
        self.events.lock().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(GovernanceEvent::name).collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: GovernanceEvent) -> Result<(), EventError> {
        self.events.lock().push(event);
        Ok(())
    }
}
