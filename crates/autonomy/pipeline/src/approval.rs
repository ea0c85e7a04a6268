//! Approval gating: trait definition, a simulated gate, and a channel-backed
//! gate for human reviewers.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use maple_autonomy_tools::{CallSource, ProposedToolCall, RiskClass};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::ApprovalError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalOutcome {
    Granted,
    Denied,
    Expired,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    /// The request id of the call awaiting approval.
    pub action_id: String,
    pub tool: String,
    pub risk_class: Option<RiskClass>,
    pub source: CallSource,
    pub params: Value,
    pub requested_at: DateTime<Utc>,
}

impl ApprovalRequest {
    pub fn for_call(call: &ProposedToolCall, risk_class: Option<RiskClass>) -> Self {
        Self {
            action_id: call.request_id.clone(),
            tool: call.tool.clone(),
            risk_class,
            source: call.source,
            params: call.params.clone(),
            requested_at: Utc::now(),
        }
    }
}

/// Something that can say yes or no to an action before it runs.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    /// Resolve a request to a final outcome. Errors mean the gate itself
    /// failed; callers treat that as a denial.
    async fn request(&self, request: ApprovalRequest) -> Result<ApprovalOutcome, ApprovalError>;
}

/// A simulated approval gate for testing and development.
///
/// - Tools with a preset decision get that decision.
/// - Otherwise anything up to `auto_grant_up_to` (reversible by default) is
///   granted immediately.
/// - Everything else gets the fallback outcome, `Expired` unless changed:
///   nobody is around to approve it.
pub struct SimulatedApprovalGate {
    auto_grant_up_to: RiskClass,
    fallback: ApprovalOutcome,
    decisions: Mutex<HashMap<String, ApprovalOutcome>>,
    requests: Mutex<Vec<ApprovalRequest>>,
}

impl SimulatedApprovalGate {
    pub fn new() -> Self {
        Self {
            auto_grant_up_to: RiskClass::Reversible,
            fallback: ApprovalOutcome::Expired,
            decisions: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Grant everything that has no preset decision.
    pub fn granting() -> Self {
        Self::new().with_fallback(ApprovalOutcome::Granted)
    }

    pub fn with_fallback(mut self, outcome: ApprovalOutcome) -> Self {
        self.fallback = outcome;
        self
    }

    pub fn with_auto_grant_up_to(mut self, risk: RiskClass) -> Self {
        self.auto_grant_up_to = risk;
        self
    }

    /// Preset the decision for every future request for `tool`.
    pub fn decide(&self, tool: impl Into<String>, outcome: ApprovalOutcome) {
        self.decisions.lock().insert(tool.into(), outcome);
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<ApprovalRequest> {
        self.requests.lock().clone()
    }
}

impl Default for SimulatedApprovalGate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApprovalGate for SimulatedApprovalGate {
    async fn request(&self, request: ApprovalRequest) -> Result<ApprovalOutcome, ApprovalError> {
        let preset = self.decisions.lock().get(&request.tool).copied();
        let outcome = match preset {
            Some(outcome) => outcome,
            None if request
                .risk_class
                .is_some_and(|risk| risk <= self.auto_grant_up_to) =>
            {
                ApprovalOutcome::Granted
            }
            None => self.fallback,
        };
        debug!(
            action_id = %request.action_id,
            tool = %request.tool,
            ?outcome,
            "Simulated approval decided"
        );
        self.requests.lock().push(request);
        Ok(outcome)
    }
}

/// A request waiting on a reviewer. Dropping it without answering denies it.
#[derive(Debug)]
pub struct PendingApproval {
    pub request: ApprovalRequest,
    responder: oneshot::Sender<ApprovalOutcome>,
}

impl PendingApproval {
    /// Returns `false` when the requester already gave up.
    pub fn respond(self, outcome: ApprovalOutcome) -> bool {
        self.responder.send(outcome).is_ok()
    }

    pub fn grant(self) -> bool {
        self.respond(ApprovalOutcome::Granted)
    }

    pub fn deny(self) -> bool {
        self.respond(ApprovalOutcome::Denied)
    }
}

/// Hands each request to a reviewer over a channel and waits up to
/// `timeout` for the answer.
pub struct ChannelApprovalGate {
    sender: mpsc::Sender<PendingApproval>,
    timeout: Duration,
}

impl ChannelApprovalGate {
    pub fn new(timeout: Duration, buffer: usize) -> (Self, mpsc::Receiver<PendingApproval>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self { sender, timeout }, receiver)
    }
}

#[async_trait]
impl ApprovalGate for ChannelApprovalGate {
    async fn request(&self, request: ApprovalRequest) -> Result<ApprovalOutcome, ApprovalError> {
        let (responder, answer) = oneshot::channel();
        let action_id = request.action_id.clone();
        self.sender
            .send(PendingApproval { request, responder })
            .await
            .map_err(|_| ApprovalError::Unavailable("reviewer channel closed".into()))?;

        match tokio::time::timeout(self.timeout, answer).await {
            Ok(Ok(outcome)) => Ok(outcome),
            Ok(Err(_)) => {
                debug!(%action_id, "Approval dropped without an answer");
                Ok(ApprovalOutcome::Denied)
            }
            Err(_) => {
                debug!(%action_id, timeout_ms = self.timeout.as_millis() as u64, "Approval expired");
                Ok(ApprovalOutcome::Expired)
            }
        }
    }
}
