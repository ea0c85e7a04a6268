use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a piece of content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    User,
    System,
    External,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::System => write!(f, "system"),
            Self::External => write!(f, "external"),
        }
    }
}

/// Identity of a content producer plus a static reliability prior.
///
/// The prior is distinct from the computed trust score; it is blended with
/// the source's feedback history during scoring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrustSource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub channel: String,
    pub reliability: f64,
}

impl TrustSource {
    pub fn new(
        id: impl Into<String>,
        kind: SourceKind,
        channel: impl Into<String>,
        reliability: f64,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            channel: channel.into(),
            reliability: clamp_unit(reliability),
        }
    }

    pub fn user(id: impl Into<String>, reliability: f64) -> Self {
        Self::new(id, SourceKind::User, "unknown", reliability)
    }

    pub fn system(id: impl Into<String>, reliability: f64) -> Self {
        Self::new(id, SourceKind::System, "unknown", reliability)
    }

    pub fn external(id: impl Into<String>, reliability: f64) -> Self {
        Self::new(id, SourceKind::External, "unknown", reliability)
    }

    pub fn on_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }
}

/// The four scored dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrustDimension {
    SourceReliability,
    ContentConsistency,
    TemporalCoherence,
    InstructionAlignment,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustDimensions {
    pub source_reliability: f64,
    pub content_consistency: f64,
    pub temporal_coherence: f64,
    pub instruction_alignment: f64,
}

impl TrustDimensions {
    /// All dimensions at full trust.
    pub fn full() -> Self {
        Self {
            source_reliability: 1.0,
            content_consistency: 1.0,
            temporal_coherence: 1.0,
            instruction_alignment: 1.0,
        }
    }

    pub fn get(&self, dimension: TrustDimension) -> f64 {
        match dimension {
            TrustDimension::SourceReliability => self.source_reliability,
            TrustDimension::ContentConsistency => self.content_consistency,
            TrustDimension::TemporalCoherence => self.temporal_coherence,
            TrustDimension::InstructionAlignment => self.instruction_alignment,
        }
    }

    pub(crate) fn get_mut(&mut self, dimension: TrustDimension) -> &mut f64 {
        match dimension {
            TrustDimension::SourceReliability => &mut self.source_reliability,
            TrustDimension::ContentConsistency => &mut self.content_consistency,
            TrustDimension::TemporalCoherence => &mut self.temporal_coherence,
            TrustDimension::InstructionAlignment => &mut self.instruction_alignment,
        }
    }

    pub(crate) fn clamped(self) -> Self {
        Self {
            source_reliability: clamp_unit(self.source_reliability),
            content_consistency: clamp_unit(self.content_consistency),
            temporal_coherence: clamp_unit(self.temporal_coherence),
            instruction_alignment: clamp_unit(self.instruction_alignment),
        }
    }
}

/// Result of one scoring call. Never persisted as the source of truth.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustScore {
    pub score: f64,
    pub dimensions: TrustDimensions,
    pub reasoning: Vec<String>,
    pub computed_at: DateTime<Utc>,
}

/// What the agent is currently trying to do.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringContext {
    #[serde(default)]
    pub active_goals: Vec<String>,
}

impl ScoringContext {
    pub fn with_goals<I, S>(goals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            active_goals: goals.into_iter().map(Into::into).collect(),
        }
    }
}

/// Outcome reported back about a source's earlier content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    Positive,
    Negative,
}

/// Clamp into `[0, 1]`, mapping NaN to 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reliability_is_clamped() {
        assert_eq!(TrustSource::user("u", 1.7).reliability, 1.0);
        assert_eq!(TrustSource::external("e", -3.0).reliability, 0.0);
        assert_eq!(TrustSource::external("e", f64::NAN).reliability, 0.0);
    }

    #[test]
    fn source_serializes_kind_as_type() {
        let json = serde_json::to_value(TrustSource::system("runtime", 0.9)).unwrap();
        assert_eq!(json["type"], "system");
    }

    #[test]
    fn dimensions_accessors() {
        let mut d = TrustDimensions::full();
        *d.get_mut(TrustDimension::TemporalCoherence) = -0.4;
        let d = d.clamped();
        assert_eq!(d.get(TrustDimension::TemporalCoherence), 0.0);
        assert_eq!(d.get(TrustDimension::ContentConsistency), 1.0);
    }
}
