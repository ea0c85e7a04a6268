//! Governance facade for the hosting runtime.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use maple_autonomy_trust::{
    Feedback, GateAction, HistorySnapshot, MemoryGate, MemoryGateDecision, ScoringContext,
    TrustScore, TrustScorer, TrustSource,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GovernanceConfig;
use crate::error::{ServiceError, StoreError};
use crate::events::{emit_best_effort, EventSink, GovernanceEvent};
use crate::message::{source_for_message, RuntimeMessage};
use crate::store::{MemoryRecord, MemoryStore, QuarantineRecord, QuarantineResolution, QuarantineStatus};

/// Result of gating one inbound message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatedMessage {
    pub message_id: String,
    pub source: TrustSource,
    pub trust: TrustScore,
    pub decision: MemoryGateDecision,
    /// Id of the memory or quarantine record written, if any.
    pub record_id: Option<String>,
}

/// Scores inbound messages, persists what the gate admits, and holds the
/// rest for review.
///
/// Store failures surface as [`ServiceError::Store`]; event failures never
/// do.
pub struct GovernanceService {
    config: GovernanceConfig,
    gate: RwLock<MemoryGate>,
    store: Arc<dyn MemoryStore>,
    events: Arc<dyn EventSink>,
}

impl GovernanceService {
    /// Refuses to start when the configuration has any issue.
    pub fn new(
        config: GovernanceConfig,
        store: Arc<dyn MemoryStore>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, ServiceError> {
        let config = config.validated()?;
        let scorer = TrustScorer::new(config.scorer_config())?;
        let gate = MemoryGate::new(config.gate_thresholds(), scorer)?;
        info!(
            write_threshold = config.trust.write_threshold,
            quarantine_threshold = config.trust.quarantine_threshold,
            "Governance service started"
        );
        Ok(Self {
            config,
            gate: RwLock::new(gate),
            store,
            events,
        })
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub async fn gate_message(&self, message: &RuntimeMessage) -> Result<GatedMessage, ServiceError> {
        self.gate_message_with_context(message, &ScoringContext::default())
            .await
    }

    pub async fn gate_message_with_context(
        &self,
        message: &RuntimeMessage,
        context: &ScoringContext,
    ) -> Result<GatedMessage, ServiceError> {
        let source = source_for_message(message, &self.config.priors);
        let evaluation = self
            .gate
            .read()
            .evaluate_with_context(message.text(), &source, context);

        emit_best_effort(
            self.events.as_ref(),
            GovernanceEvent::TrustScored {
                message_id: message.id.clone(),
                source_id: source.id.clone(),
                trust: evaluation.trust.clone(),
            },
        );

        let decision = evaluation.decision;
        let record_id = match decision.action {
            GateAction::Allow => {
                let record = MemoryRecord::new(message.text(), &source.id, decision.score)
                    .with_metadata("messageId", message.id.clone())
                    .with_metadata("channel", source.channel.clone());
                let id = record.id.clone();
                self.bounded("save_memory", self.store.save_memory(record))
                    .await?;
                Some(id)
            }
            GateAction::Quarantine => {
                let record = QuarantineRecord::new(
                    message.text(),
                    &source,
                    decision.score,
                    decision.reason.clone(),
                    self.config.quarantine_ttl(),
                );
                let id = record.id.clone();
                self.bounded("save_quarantine", self.store.save_quarantine(record))
                    .await?;
                Some(id)
            }
            GateAction::Reject => None,
        };

        match decision.action {
            GateAction::Allow => debug!(
                message_id = %message.id,
                source = %source.id,
                score = decision.score,
                "Message admitted to memory"
            ),
            GateAction::Quarantine | GateAction::Reject => warn!(
                message_id = %message.id,
                source = %source.id,
                action = %decision.action,
                score = decision.score,
                reason = %decision.reason,
                "Message held back by memory gate"
            ),
        }

        emit_best_effort(
            self.events.as_ref(),
            GovernanceEvent::MemoryGated {
                message_id: message.id.clone(),
                source_id: source.id.clone(),
                decision: decision.clone(),
                record_id: record_id.clone(),
                at: Utc::now(),
            },
        );

        Ok(GatedMessage {
            message_id: message.id.clone(),
            source,
            trust: evaluation.trust,
            decision,
            record_id,
        })
    }

    pub fn record_feedback(&self, source_id: &str, feedback: Feedback) {
        self.gate.write().record_feedback(source_id, feedback);
    }

    /// Resolve a quarantined record. Approval promotes it to memory; either
    /// verdict is fed back into the source's reliability history.
    ///
    /// An approved record is saved to memory before it is marked resolved,
    /// so a failed save leaves it pending and the call can be retried.
    pub async fn resolve_quarantine(
        &self,
        id: &str,
        resolution: QuarantineResolution,
        reason: Option<String>,
    ) -> Result<QuarantineRecord, ServiceError> {
        if resolution == QuarantineResolution::Approve {
            let pending = self
                .bounded("get_quarantine", self.store.get_quarantine(id))
                .await?;
            if pending.is_pending() && !pending.is_expired_at(Utc::now()) {
                let memory = MemoryRecord::from_quarantine(&pending);
                self.bounded("save_memory", self.store.save_memory(memory))
                    .await?;
            }
        }

        let record = self
            .bounded(
                "resolve_quarantine",
                self.store.resolve_quarantine(id, resolution, reason),
            )
            .await?;

        let feedback = match record.status {
            QuarantineStatus::Approved => Feedback::Positive,
            _ => Feedback::Negative,
        };
        self.record_feedback(&record.source_id, feedback);
        info!(quarantine_id = %record.id, status = %record.status, "Quarantine resolved");
        Ok(record)
    }

    pub async fn pending_quarantine(&self) -> Result<Vec<QuarantineRecord>, ServiceError> {
        Ok(self
            .bounded("list_pending_quarantine", self.store.list_pending_quarantine())
            .await?)
    }

    /// Expire pending records past their deadline.
    pub async fn sweep_expired(&self) -> Result<Vec<QuarantineRecord>, ServiceError> {
        let expired = self
            .bounded("expire_quarantine", self.store.expire_quarantine(Utc::now()))
            .await?;
        if !expired.is_empty() {
            info!(count = expired.len(), "Expired quarantined records");
        }
        Ok(expired)
    }

    pub fn snapshot_history(&self) -> HistorySnapshot {
        self.gate.read().scorer().snapshot_history()
    }

    pub fn restore_history(&self, snapshot: HistorySnapshot) {
        self.gate.write().restore_history(snapshot);
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let timeout = self.config.store_timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout_ms = millis(timeout), "Store call timed out");
                Err(StoreError::Timeout {
                    operation,
                    timeout_ms: millis(timeout),
                })
            }
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
