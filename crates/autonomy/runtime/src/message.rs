use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use maple_autonomy_trust::{SourceKind, TrustSource};

use crate::config::SourcePriors;

const SYSTEM_SOURCE_TAGS: &[&str] = &["system", "platform"];
const UNKNOWN: &str = "unknown";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub text: String,
}

/// An inbound message as the hosting runtime delivers it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeMessage {
    pub id: String,
    #[serde(default)]
    pub content: MessageContent,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl RuntimeMessage {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: MessageContent { text: text.into() },
            sender_id: None,
            metadata: Map::new(),
        }
    }

    pub fn from_sender(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.content.text
    }

    fn is_system_tagged(&self) -> bool {
        let tagged = self
            .metadata
            .get("source")
            .and_then(Value::as_str)
            .is_some_and(|s| SYSTEM_SOURCE_TAGS.iter().any(|t| s.eq_ignore_ascii_case(t)));
        tagged || self.metadata.get("isSystem").and_then(Value::as_bool) == Some(true)
    }

    fn sender(&self) -> Option<&str> {
        self.sender_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Map a message onto a trust source: system-tagged, then identifiable
/// sender, then external. The prior comes from `priors`.
pub fn source_for_message(message: &RuntimeMessage, priors: &SourcePriors) -> TrustSource {
    let (kind, id) = if message.is_system_tagged() {
        (SourceKind::System, message.sender().unwrap_or("system"))
    } else if let Some(sender) = message.sender() {
        (SourceKind::User, sender)
    } else {
        (SourceKind::External, UNKNOWN)
    };
    let channel = message
        .metadata
        .get("channel")
        .and_then(Value::as_str)
        .filter(|c| !c.trim().is_empty())
        .unwrap_or(UNKNOWN);
    TrustSource::new(id, kind, channel, priors.for_kind(kind))
}
