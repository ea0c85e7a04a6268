use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Feedback;

/// Reliability for a source that has never received feedback.
const UNSEEN_RELIABILITY: f64 = 0.5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEvent {
    pub feedback: Feedback,
    pub recorded_at: DateTime<Utc>,
}

/// Serializable export of a [`SourceHistory`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    pub window: usize,
    pub sources: BTreeMap<String, Vec<FeedbackEvent>>,
}

/// Per-source feedback, bounded to the most recent `window` events.
#[derive(Clone, Debug)]
pub struct SourceHistory {
    window: usize,
    sources: HashMap<String, VecDeque<FeedbackEvent>>,
}

impl SourceHistory {
    /// `window` is clamped to at least 1.
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            sources: HashMap::new(),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn record(&mut self, source_id: &str, feedback: Feedback) {
        self.record_at(source_id, feedback, Utc::now());
    }

    pub fn record_at(&mut self, source_id: &str, feedback: Feedback, at: DateTime<Utc>) {
        let events = self.sources.entry(source_id.to_string()).or_default();
        if events.len() == self.window {
            events.pop_front();
        }
        events.push_back(FeedbackEvent {
            feedback,
            recorded_at: at,
        });
    }

    /// Fraction of retained events that were positive; 0.5 when unseen.
    pub fn reliability(&self, source_id: &str) -> f64 {
        match self.sources.get(source_id) {
            Some(events) if !events.is_empty() => {
                let positive = events
                    .iter()
                    .filter(|e| e.feedback == Feedback::Positive)
                    .count();
                positive as f64 / events.len() as f64
            }
            _ => UNSEEN_RELIABILITY,
        }
    }

    pub fn event_count(&self, source_id: &str) -> usize {
        self.sources.get(source_id).map_or(0, VecDeque::len)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn forget(&mut self, source_id: &str) -> bool {
        self.sources.remove(source_id).is_some()
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            window: self.window,
            sources: self
                .sources
                .iter()
                .map(|(id, events)| (id.clone(), events.iter().cloned().collect()))
                .collect(),
        }
    }

    /// Rebuild from a snapshot, keeping this history's window. Sources with
    /// more events than the window keep only the most recent ones.
    pub fn restore(&mut self, snapshot: HistorySnapshot) {
        self.sources.clear();
        for (id, mut events) in snapshot.sources {
            events.sort_by_key(|e| e.recorded_at);
            let skip = events.len().saturating_sub(self.window);
            let retained: VecDeque<FeedbackEvent> = events.into_iter().skip(skip).collect();
            if !retained.is_empty() {
                self.sources.insert(id, retained);
            }
        }
    }
}

impl Default for SourceHistory {
    fn default() -> Self {
        Self::new(100)
    }
}
