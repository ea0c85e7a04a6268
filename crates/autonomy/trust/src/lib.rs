#![deny(unsafe_code)]
//! # maple-autonomy-trust
//!
//! Decides how far a piece of inbound content should be believed before it
//! is allowed anywhere near durable memory.
//!
//! - [`TrustScorer`]: scores text over four dimensions using an ordered,
//!   data-driven [`TrustRule`] table and a per-source feedback history.
//! - [`MemoryGate`]: two-threshold admission policy on top of the scorer:
//!   allow, quarantine, or reject.

pub mod error;
pub mod gate;
pub mod history;
pub mod rules;
pub mod scorer;
pub mod types;

pub use error::TrustError;
pub use gate::{GateAction, GateEvaluation, GateThresholds, MemoryGate, MemoryGateDecision};
pub use history::{FeedbackEvent, HistorySnapshot, SourceHistory};
pub use rules::{default_rules, RuleCategory, TrustRule};
pub use scorer::{TrustScorer, TrustScorerConfig, TrustWeights};
pub use types::{
    Feedback, ScoringContext, SourceKind, TrustDimension, TrustDimensions, TrustScore, TrustSource,
};
