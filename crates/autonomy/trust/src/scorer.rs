use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TrustError;
use crate::history::{HistorySnapshot, SourceHistory};
use crate::rules::{default_rules, RuleCategory, TrustRule};
use crate::types::{
    clamp_unit, Feedback, ScoringContext, TrustDimensions, TrustScore, TrustSource,
};

/// Blend weights for the composite score. Must sum to 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustWeights {
    pub source_reliability: f64,
    pub content_consistency: f64,
    pub temporal_coherence: f64,
    pub instruction_alignment: f64,
}

impl Default for TrustWeights {
    fn default() -> Self {
        Self {
            source_reliability: 0.30,
            content_consistency: 0.30,
            temporal_coherence: 0.15,
            instruction_alignment: 0.25,
        }
    }
}

impl TrustWeights {
    fn sum(&self) -> f64 {
        self.source_reliability
            + self.content_consistency
            + self.temporal_coherence
            + self.instruction_alignment
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustScorerConfig {
    pub weights: TrustWeights,
    /// Feedback events retained per source.
    pub history_window: usize,
    /// Content longer than this many characters is penalised.
    pub max_content_chars: usize,
    pub length_penalty: f64,
    /// Subtracted from the composite for every injection finding.
    pub injection_penalty: f64,
    /// Below this source reliability a baseline note is added.
    pub low_reliability_note_below: f64,
}

impl Default for TrustScorerConfig {
    fn default() -> Self {
        Self {
            weights: TrustWeights::default(),
            history_window: 100,
            max_content_chars: 10_000,
            length_penalty: 0.1,
            injection_penalty: 0.15,
            low_reliability_note_below: 0.3,
        }
    }
}

impl TrustScorerConfig {
    pub fn validate(&self) -> Result<(), TrustError> {
        let w = &self.weights;
        let parts = [
            w.source_reliability,
            w.content_consistency,
            w.temporal_coherence,
            w.instruction_alignment,
        ];
        if parts.iter().any(|p| !(0.0..=1.0).contains(p)) || (w.sum() - 1.0).abs() > 1e-6 {
            return Err(TrustError::InvalidConfig(format!(
                "dimension weights must lie in [0, 1] and sum to 1 (got {:.3})",
                w.sum()
            )));
        }
        if self.history_window == 0 {
            return Err(TrustError::InvalidConfig(
                "history window must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.length_penalty)
            || !(0.0..=1.0).contains(&self.injection_penalty)
        {
            return Err(TrustError::InvalidConfig(
                "penalties must lie in [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// Heuristic content trust scorer.
///
/// Owns the source reliability history; feedback is the only mutation.
#[derive(Clone, Debug)]
pub struct TrustScorer {
    config: TrustScorerConfig,
    rules: Vec<TrustRule>,
    history: SourceHistory,
}

impl TrustScorer {
    pub fn new(config: TrustScorerConfig) -> Result<Self, TrustError> {
        config.validate()?;
        Ok(Self {
            history: SourceHistory::new(config.history_window),
            rules: default_rules(),
            config,
        })
    }

    /// Append a rule after the built-in table.
    pub fn with_rule(mut self, rule: TrustRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn config(&self) -> &TrustScorerConfig {
        &self.config
    }

    pub fn rules(&self) -> &[TrustRule] {
        &self.rules
    }

    pub fn history(&self) -> &SourceHistory {
        &self.history
    }

    pub fn record_feedback(&mut self, source_id: &str, feedback: Feedback) {
        debug!(source_id, ?feedback, "Recording source feedback");
        self.history.record(source_id, feedback);
    }

    pub fn snapshot_history(&self) -> HistorySnapshot {
        self.history.snapshot()
    }

    pub fn restore_history(&mut self, snapshot: HistorySnapshot) {
        self.history.restore(snapshot);
    }

    /// Score `text` produced by `source`.
    pub fn score(&self, text: &str, source: &TrustSource, context: &ScoringContext) -> TrustScore {
        let mut dimensions = TrustDimensions::full();
        let mut reasoning = Vec::new();
        let mut composite_penalty = 0.0;

        let prior = clamp_unit(source.reliability);
        let historical = self.history.reliability(&source.id);
        dimensions.source_reliability = 0.5 * prior + 0.5 * historical;
        if dimensions.source_reliability < self.config.low_reliability_note_below {
            reasoning.push(format!(
                "low source reliability {:.2} for {} source '{}'",
                dimensions.source_reliability, source.kind, source.id
            ));
        }

        let goals_active = !context.active_goals.is_empty();
        for rule in &self.rules {
            if rule.category == RuleCategory::GoalInterference && !goals_active {
                continue;
            }
            if !rule.is_match(text) {
                continue;
            }
            *dimensions.get_mut(rule.dimension) -= rule.weight;
            if rule.category == RuleCategory::Injection {
                composite_penalty += self.config.injection_penalty;
            }
            reasoning.push(format!("{}: {}", rule.category, rule.label));
        }

        let length = text.chars().count();
        if length > self.config.max_content_chars {
            composite_penalty += self.config.length_penalty;
            reasoning.push(format!(
                "content length {length} exceeds {} characters",
                self.config.max_content_chars
            ));
        }

        let dimensions = dimensions.clamped();
        let w = &self.config.weights;
        let blended = w.source_reliability * dimensions.source_reliability
            + w.content_consistency * dimensions.content_consistency
            + w.temporal_coherence * dimensions.temporal_coherence
            + w.instruction_alignment * dimensions.instruction_alignment;
        let score = clamp_unit(blended - composite_penalty);

        debug!(
            source_id = %source.id,
            score,
            findings = reasoning.len(),
            "Scored content"
        );

        TrustScore {
            score,
            dimensions,
            reasoning,
            computed_at: Utc::now(),
        }
    }
}

impl Default for TrustScorer {
    fn default() -> Self {
        Self {
            config: TrustScorerConfig::default(),
            rules: default_rules(),
            history: SourceHistory::default(),
        }
    }
}
