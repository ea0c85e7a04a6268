use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::IdentityError;
use crate::hash::compute_identity_hash;

/// Tone categories an agent persona can declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Formal,
    Casual,
    Technical,
    Empathetic,
}

impl Tone {
    pub const ALL: [Tone; 4] = [Tone::Formal, Tone::Casual, Tone::Technical, Tone::Empathetic];
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Formal => write!(f, "formal"),
            Self::Casual => write!(f, "casual"),
            Self::Technical => write!(f, "technical"),
            Self::Empathetic => write!(f, "empathetic"),
        }
    }
}

/// How long an agent's responses are expected to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Concise,
    Balanced,
    Detailed,
}

impl Verbosity {
    /// Acceptable word-count range for a single output at this level.
    pub fn word_range(&self) -> RangeInclusive<usize> {
        match self {
            Self::Concise => 1..=80,
            Self::Balanced => 15..=250,
            Self::Detailed => 60..=1200,
        }
    }
}

impl std::fmt::Display for Verbosity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Concise => write!(f, "concise"),
            Self::Balanced => write!(f, "balanced"),
            Self::Detailed => write!(f, "detailed"),
        }
    }
}

/// Declared communication style.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationStyle {
    pub tone: Tone,
    pub verbosity: Verbosity,
    pub persona_voice: String,
}

impl Default for CommunicationStyle {
    fn default() -> Self {
        Self {
            tone: Tone::Casual,
            verbosity: Verbosity::Balanced,
            persona_voice: String::new(),
        }
    }
}

/// The declared identity of an autonomous agent.
///
/// `identity_version` and `identity_hash` are kernel-managed: they change
/// only when an accepted update is applied through
/// [`IdentityManager`](crate::IdentityManager).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutonomyIdentityConfig {
    pub name: String,
    pub core_values: Vec<String>,
    pub communication_style: CommunicationStyle,
    pub hard_boundaries: Vec<String>,
    #[serde(default)]
    pub soft_preferences: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub identity_version: u64,
    #[serde(default)]
    pub identity_hash: String,
}

impl AutonomyIdentityConfig {
    /// Create an identity at version 1 with a freshly computed hash.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            core_values: Vec::new(),
            communication_style: CommunicationStyle::default(),
            hard_boundaries: Vec::new(),
            soft_preferences: BTreeMap::new(),
            identity_version: 1,
            identity_hash: String::new(),
        }
        .sealed()
    }

    pub fn with_core_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core_values = values.into_iter().map(Into::into).collect();
        self.sealed()
    }

    pub fn with_hard_boundaries<I, S>(mut self, boundaries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hard_boundaries = boundaries.into_iter().map(Into::into).collect();
        self.sealed()
    }

    pub fn with_style(mut self, style: CommunicationStyle) -> Self {
        self.communication_style = style;
        self.sealed()
    }

    pub fn with_soft_preference(
        mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.soft_preferences.insert(key.into(), value);
        self.sealed()
    }

    /// Recompute and store the integrity hash.
    pub fn sealed(mut self) -> Self {
        self.identity_hash = compute_identity_hash(&self);
        self
    }

    /// Whether the stored hash matches the current content.
    pub fn verify_hash(&self) -> bool {
        !self.identity_hash.is_empty() && self.identity_hash == compute_identity_hash(self)
    }

    /// Structural validation of a loaded identity.
    pub fn validate(&self) -> Result<(), IdentityError> {
        if self.name.trim().is_empty() {
            return Err(IdentityError::Invalid("name must not be empty".into()));
        }
        if self.core_values.iter().any(|v| v.trim().is_empty()) {
            return Err(IdentityError::Invalid("core values must not be blank".into()));
        }
        if self.hard_boundaries.iter().any(|b| b.trim().is_empty()) {
            return Err(IdentityError::Invalid("hard boundaries must not be blank".into()));
        }
        Ok(())
    }

    /// Parse an identity from JSON.
    pub fn from_json(json: &str) -> Result<Self, IdentityError> {
        let identity: Self = serde_json::from_str(json)?;
        identity.validate()?;
        Ok(identity)
    }
}

/// Partial update to [`CommunicationStyle`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationStylePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<Tone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<Verbosity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_voice: Option<String>,
}

/// A proposed identity mutation.
///
/// Every field is optional; `soft_preferences` merges key by key. The
/// kernel-managed fields are representable so that direct attempts to set
/// them can be detected and refused.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_style: Option<CommunicationStylePatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hard_boundaries: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_preferences: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_hash: Option<String>,
}

impl IdentityPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn core_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn hard_boundaries<I, S>(mut self, boundaries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hard_boundaries = Some(boundaries.into_iter().map(Into::into).collect());
        self
    }

    pub fn tone(mut self, tone: Tone) -> Self {
        self.communication_style.get_or_insert_with(Default::default).tone = Some(tone);
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.communication_style
            .get_or_insert_with(Default::default)
            .verbosity = Some(verbosity);
        self
    }

    pub fn persona_voice(mut self, voice: impl Into<String>) -> Self {
        self.communication_style
            .get_or_insert_with(Default::default)
            .persona_voice = Some(voice.into());
        self
    }

    pub fn soft_preference(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.soft_preferences
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
        self
    }

    /// True when the patch touches `identityVersion` or `identityHash`.
    pub fn touches_kernel_managed(&self) -> bool {
        self.identity_version.is_some() || self.identity_hash.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
