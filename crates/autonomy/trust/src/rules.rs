//! Ordered detection rule table for the trust scorer.
//!
//! Each rule is `(pattern, category, dimension, weight, label)`. Rules are
//! evaluated in table order and each contributes at most once per scoring
//! call, so the same input always yields the same reasoning list.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TrustError;
use crate::types::TrustDimension;

/// What kind of attack a rule looks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    /// Attempts to replace or extract the agent's instructions.
    Injection,
    /// False authority, forced agreement, coercive urgency.
    Manipulation,
    /// Claims that the agent is someone or something else.
    IdentityOverride,
    /// Instructions to abandon the current goal. Only checked when the
    /// scoring context carries active goals.
    GoalInterference,
    /// Claims of prior agreement the agent cannot verify.
    FalseContinuity,
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Injection => write!(f, "injection"),
            Self::Manipulation => write!(f, "manipulation"),
            Self::IdentityOverride => write!(f, "identity_override"),
            Self::GoalInterference => write!(f, "goal_interference"),
            Self::FalseContinuity => write!(f, "false_continuity"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TrustRule {
    pub label: String,
    pub category: RuleCategory,
    pub dimension: TrustDimension,
    pub weight: f64,
    pattern: Regex,
}

impl TrustRule {
    /// Compile a rule. Weight is clamped into `[0, 1]`.
    pub fn new(
        label: impl Into<String>,
        category: RuleCategory,
        dimension: TrustDimension,
        weight: f64,
        pattern: &str,
    ) -> Result<Self, TrustError> {
        let label = label.into();
        let pattern = Regex::new(pattern).map_err(|source| TrustError::InvalidPattern {
            label: label.clone(),
            source,
        })?;
        Ok(Self {
            label,
            category,
            dimension,
            weight: if weight.is_nan() { 0.0 } else { weight.clamp(0.0, 1.0) },
            pattern,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

type RuleSpec = (&'static str, RuleCategory, TrustDimension, f64, &'static str);

const DEFAULT_RULE_SPECS: &[RuleSpec] = &[
    // Injection
    (
        "ignore_previous_instructions",
        RuleCategory::Injection,
        TrustDimension::ContentConsistency,
        0.5,
        r"(?i)\b(ignore|disregard|forget|override)\s+(all\s+)?(of\s+)?(the\s+|your\s+)?(previous|prior|above|earlier|preceding|original)\s+(instructions|prompts?|rules|directives|guidelines)",
    ),
    (
        "role_override",
        RuleCategory::Injection,
        TrustDimension::ContentConsistency,
        0.4,
        r"(?i)\b(you\s+are\s+now\s+(an?\s+)?(unrestricted|unfiltered|jailbroken|dan\b|evil)|from\s+now\s+on,?\s+you\s+(will|must)\s+(act|respond|behave)\s+as|enter\s+(developer|god|debug)\s+mode)",
    ),
    (
        "system_prompt_extraction",
        RuleCategory::Injection,
        TrustDimension::ContentConsistency,
        0.5,
        r"(?i)\b(reveal|show|print|repeat|output|leak|dump|tell\s+me)\s+(me\s+)?(your|the)\s+(full\s+|entire\s+|original\s+)?(system\s+prompt|hidden\s+(instructions|prompt)|initial\s+(instructions|prompt))",
    ),
    (
        "fake_chat_delimiter",
        RuleCategory::Injection,
        TrustDimension::ContentConsistency,
        0.4,
        r"(?im)(^\s*(###\s*)?(system|assistant)\s*:|<\|im_(start|end)\|>|\[/?INST\]|</?system>)",
    ),
    // Manipulation
    (
        "false_authority",
        RuleCategory::Manipulation,
        TrustDimension::ContentConsistency,
        0.3,
        r"(?i)\byour\s+(creators?|developers?|owners?|admins?|administrators?|makers?)\s+(said|says|told\s+me|wants?|instructed|authorized|approved)",
    ),
    (
        "forced_agreement",
        RuleCategory::Manipulation,
        TrustDimension::ContentConsistency,
        0.3,
        r"(?i)\b(you\s+(must|have\s+to|need\s+to)\s+agree|admit\s+(that\s+)?you\s+(are|were)\s+wrong|any\s+reasonable\s+ai\s+would\s+agree)",
    ),
    (
        "coercive_urgency",
        RuleCategory::Manipulation,
        TrustDimension::ContentConsistency,
        0.2,
        r"(?i)\b(do\s+it\s+now\s+or|immediately\s+or\s+else|before\s+it'?s\s+too\s+late|there'?s\s+no\s+time\s+to\s+(think|verify|check))",
    ),
    // Identity override
    (
        "not_an_ai",
        RuleCategory::IdentityOverride,
        TrustDimension::InstructionAlignment,
        0.4,
        r"(?i)\byou\s+are\s+(not|no\s+longer)\s+(really\s+)?(an?\s+)?(ai|assistant|language\s+model|bot|machine)\b",
    ),
    (
        "true_self",
        RuleCategory::IdentityOverride,
        TrustDimension::InstructionAlignment,
        0.4,
        r"(?i)\byour\s+(true|real|hidden|inner)\s+(self|identity|purpose|personality|nature)\s+is",
    ),
    (
        "rules_disclaimer",
        RuleCategory::IdentityOverride,
        TrustDimension::InstructionAlignment,
        0.3,
        r"(?i)\b(pretend|imagine|act\s+as\s+if)\s+(that\s+)?you\s+(have|had)\s+no\s+(rules|restrictions|guidelines|boundaries|values)",
    ),
    // Goal interference
    (
        "abandon_goal",
        RuleCategory::GoalInterference,
        TrustDimension::InstructionAlignment,
        0.35,
        r"(?i)\b(stop|abandon|drop|quit|forget\s+about|give\s+up\s+on)\s+(what\s+you\s+are\s+doing|what\s+you'?re\s+doing|your\s+(current\s+)?(goals?|tasks?|objectives?|mission|work))",
    ),
    (
        "priority_hijack",
        RuleCategory::GoalInterference,
        TrustDimension::InstructionAlignment,
        0.25,
        r"(?i)\b(your\s+(only|new|real)\s+(goal|task|priority|objective)\s+is|nothing\s+else\s+matters\s+(but|except))",
    ),
    // False continuity
    (
        "claimed_prior_agreement",
        RuleCategory::FalseContinuity,
        TrustDimension::TemporalCoherence,
        0.35,
        r"(?i)\b(as\s+you\s+(agreed|promised|confirmed)(\s+(earlier|before|previously|yesterday|last\s+time))?|you\s+already\s+(agreed|promised|confirmed|said\s+yes))",
    ),
    (
        "fabricated_history",
        RuleCategory::FalseContinuity,
        TrustDimension::TemporalCoherence,
        0.3,
        r"(?i)\b(remember\s+when\s+you\s+(agreed|said|promised|told\s+me)|we\s+(already\s+)?(agreed|established|settled)\s+(earlier|before|last\s+time))",
    ),
];

static DEFAULT_RULES: LazyLock<Vec<TrustRule>> = LazyLock::new(|| {
    DEFAULT_RULE_SPECS
        .iter()
        .map(|(label, category, dimension, weight, pattern)| {
            TrustRule::new(*label, *category, *dimension, *weight, pattern)
                .expect("invalid built-in trust rule")
        })
        .collect()
});

/// The built-in rule table, in evaluation order.
pub fn default_rules() -> Vec<TrustRule> {
    DEFAULT_RULES.clone()
}
