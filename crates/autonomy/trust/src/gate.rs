//! Memory admission gate.
//!
//! Two thresholds split the trust range into three bands:
//!
//! ```text
//! 0 ── reject ── quarantine_threshold ── quarantine ── write_threshold ── allow ── 1
//! ```
//!
//! The gate is a pure decision. Persisting, quarantining and emitting events
//! are the caller's job.

use serde::{Deserialize, Serialize};

use crate::error::TrustError;
use crate::history::HistorySnapshot;
use crate::scorer::TrustScorer;
use crate::types::{Feedback, ScoringContext, TrustScore, TrustSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateAction {
    Allow,
    Quarantine,
    Reject,
}

impl std::fmt::Display for GateAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Quarantine => write!(f, "quarantine"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateThresholds {
    pub write_threshold: f64,
    pub quarantine_threshold: f64,
}

impl Default for GateThresholds {
    fn default() -> Self {
        Self {
            write_threshold: 0.7,
            quarantine_threshold: 0.35,
        }
    }
}

impl GateThresholds {
    /// Both within `[0, 1]` and `quarantine < write`.
    pub fn new(write_threshold: f64, quarantine_threshold: f64) -> Result<Self, TrustError> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if !in_range(write_threshold)
            || !in_range(quarantine_threshold)
            || quarantine_threshold >= write_threshold
        {
            return Err(TrustError::InvalidThresholds {
                write: write_threshold,
                quarantine: quarantine_threshold,
            });
        }
        Ok(Self {
            write_threshold,
            quarantine_threshold,
        })
    }

    pub fn action_for(&self, score: f64) -> GateAction {
        if score >= self.write_threshold {
            GateAction::Allow
        } else if score < self.quarantine_threshold {
            GateAction::Reject
        } else {
            GateAction::Quarantine
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryGateDecision {
    pub action: GateAction,
    pub reason: String,
    pub score: f64,
}

/// A decision together with the trust score it was derived from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateEvaluation {
    pub trust: TrustScore,
    pub decision: MemoryGateDecision,
}

/// Trust scorer plus threshold policy.
#[derive(Clone, Debug)]
pub struct MemoryGate {
    thresholds: GateThresholds,
    scorer: TrustScorer,
}

impl MemoryGate {
    /// Fails when the thresholds are out of order or out of range.
    pub fn new(thresholds: GateThresholds, scorer: TrustScorer) -> Result<Self, TrustError> {
        let thresholds =
            GateThresholds::new(thresholds.write_threshold, thresholds.quarantine_threshold)?;
        Ok(Self { thresholds, scorer })
    }

    pub fn thresholds(&self) -> GateThresholds {
        self.thresholds
    }

    pub fn scorer(&self) -> &TrustScorer {
        &self.scorer
    }

    pub fn record_feedback(&mut self, source_id: &str, feedback: Feedback) {
        self.scorer.record_feedback(source_id, feedback);
    }

    pub fn restore_history(&mut self, snapshot: HistorySnapshot) {
        self.scorer.restore_history(snapshot);
    }

    /// The threshold policy alone.
    pub fn decide(&self, score: f64) -> MemoryGateDecision {
        self.decide_with_findings(score, &[])
    }

    pub fn evaluate(&self, content: &str, source: &TrustSource) -> MemoryGateDecision {
        self.evaluate_with_context(content, source, &ScoringContext::default())
            .decision
    }

    pub fn evaluate_with_context(
        &self,
        content: &str,
        source: &TrustSource,
        context: &ScoringContext,
    ) -> GateEvaluation {
        let trust = self.scorer.score(content, source, context);
        let decision = self.decide_with_findings(trust.score, &trust.reasoning);
        GateEvaluation { trust, decision }
    }

    fn decide_with_findings(&self, score: f64, findings: &[String]) -> MemoryGateDecision {
        // NaN never reaches allow.
        let score = if score.is_nan() { 0.0 } else { score };
        let action = self.thresholds.action_for(score);
        let mut reason = match action {
            GateAction::Allow => format!(
                "trust score {score:.2} meets write threshold {:.2}",
                self.thresholds.write_threshold
            ),
            GateAction::Quarantine => format!(
                "trust score {score:.2} below write threshold {:.2}; held for review",
                self.thresholds.write_threshold
            ),
            GateAction::Reject => format!(
                "trust score {score:.2} below quarantine threshold {:.2}",
                self.thresholds.quarantine_threshold
            ),
        };
        if action != GateAction::Allow && !findings.is_empty() {
            reason.push_str(&format!(" ({})", findings.join("; ")));
        }
        MemoryGateDecision {
            action,
            reason,
            score,
        }
    }
}

impl Default for MemoryGate {
    fn default() -> Self {
        Self {
            thresholds: GateThresholds::default(),
            scorer: TrustScorer::default(),
        }
    }
}
