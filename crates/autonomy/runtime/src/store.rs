//! Record shapes handed to the durable memory store, the store trait, and an
//! in-memory implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use maple_autonomy_trust::{SourceKind, TrustSource};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::StoreError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuarantineStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl std::fmt::Display for QuarantineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// A reviewer's verdict on a quarantined record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuarantineResolution {
    Approve,
    Reject,
}

impl QuarantineResolution {
    fn status(self) -> QuarantineStatus {
        match self {
            Self::Approve => QuarantineStatus::Approved,
            Self::Reject => QuarantineStatus::Rejected,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarantineRecord {
    pub id: String,
    pub content: String,
    pub source_id: String,
    pub source_kind: SourceKind,
    pub trust_score: f64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: QuarantineStatus,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_reason: Option<String>,
}

impl QuarantineRecord {
    pub fn new(
        content: impl Into<String>,
        source: &TrustSource,
        trust_score: f64,
        reason: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            source_id: source.id.clone(),
            source_kind: source.kind,
            trust_score,
            reason: reason.into(),
            created_at,
            expires_at: created_at + ttl,
            status: QuarantineStatus::Pending,
            resolved_at: None,
            resolution_reason: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == QuarantineStatus::Pending
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && now >= self.expires_at
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    pub id: String,
    pub content: String,
    pub source_id: String,
    pub trust_score: f64,
    pub created_at: DateTime<Utc>,
    pub metadata: Map<String, Value>,
}

impl MemoryRecord {
    pub fn new(content: impl Into<String>, source_id: impl Into<String>, trust_score: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            source_id: source_id.into(),
            trust_score,
            created_at: Utc::now(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Promote an approved quarantine record. The memory keeps the
    /// quarantine id, so promoting the same record twice overwrites.
    pub fn from_quarantine(record: &QuarantineRecord) -> Self {
        let mut memory = Self::new(&record.content, &record.source_id, record.trust_score)
            .with_metadata("quarantineId", record.id.clone());
        memory.id = record.id.clone();
        memory
    }
}

/// Durable storage for admitted and quarantined content.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Insert a memory, replacing any existing record with the same id.
    async fn save_memory(&self, record: MemoryRecord) -> Result<(), StoreError>;

    async fn save_quarantine(&self, record: QuarantineRecord) -> Result<(), StoreError>;

    async fn get_quarantine(&self, id: &str) -> Result<QuarantineRecord, StoreError>;

    /// Resolve a pending record. Records past their expiry are marked
    /// expired and reported as already resolved.
    async fn resolve_quarantine(
        &self,
        id: &str,
        resolution: QuarantineResolution,
        reason: Option<String>,
    ) -> Result<QuarantineRecord, StoreError>;

    /// Pending records that have not expired, oldest first.
    async fn list_pending_quarantine(&self) -> Result<Vec<QuarantineRecord>, StoreError>;

    /// Mark every pending record past its expiry as expired and return them.
    async fn expire_quarantine(&self, now: DateTime<Utc>) -> Result<Vec<QuarantineRecord>, StoreError>;
}

/// Process-local store for tests and development.
#[derive(Debug)]
pub struct InMemoryStore {
    memories: RwLock<Vec<MemoryRecord>>,
    quarantine: RwLock<HashMap<String, QuarantineRecord>>,
    available: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            memories: RwLock::new(Vec::new()),
            quarantine: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage: every call fails with [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn memories(&self) -> Vec<MemoryRecord> {
        self.memories.read().clone()
    }

    pub fn quarantine_record(&self, id: &str) -> Option<QuarantineRecord> {
        self.quarantine.read().get(id).cloned()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store marked unavailable".into()))
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn save_memory(&self, record: MemoryRecord) -> Result<(), StoreError> {
        self.check()?;
        let mut memories = self.memories.write();
        match memories.iter_mut().find(|m| m.id == record.id) {
            Some(existing) => *existing = record,
            None => memories.push(record),
        }
        Ok(())
    }

    async fn save_quarantine(&self, record: QuarantineRecord) -> Result<(), StoreError> {
        self.check()?;
        self.quarantine.write().insert(record.id.clone(), record);
        Ok(())
    }

    async fn get_quarantine(&self, id: &str) -> Result<QuarantineRecord, StoreError> {
        self.check()?;
        self.quarantine_record(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn resolve_quarantine(
        &self,
        id: &str,
        resolution: QuarantineResolution,
        reason: Option<String>,
    ) -> Result<QuarantineRecord, StoreError> {
        self.check()?;
        let now = Utc::now();
        let mut quarantine = self.quarantine.write();
        let record = quarantine
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if record.is_expired_at(now) {
            record.status = QuarantineStatus::Expired;
            record.resolved_at = Some(now);
        }
        if !record.is_pending() {
            return Err(StoreError::AlreadyResolved {
                id: id.to_string(),
                status: record.status,
            });
        }

        record.status = resolution.status();
        record.resolved_at = Some(now);
        record.resolution_reason = reason;
        Ok(record.clone())
    }

    async fn list_pending_quarantine(&self) -> Result<Vec<QuarantineRecord>, StoreError> {
        self.check()?;
        let now = Utc::now();
        let mut pending: Vec<_> = self
            .quarantine
            .read()
            .values()
            .filter(|r| r.is_pending() && !r.is_expired_at(now))
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(pending)
    }

    async fn expire_quarantine(&self, now: DateTime<Utc>) -> Result<Vec<QuarantineRecord>, StoreError> {
        self.check()?;
        let mut expired = Vec::new();
        for record in self.quarantine.write().values_mut() {
            if record.is_expired_at(now) {
                record.status = QuarantineStatus::Expired;
                record.resolved_at = Some(now);
                expired.push(record.clone());
            }
        }
        expired.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(expired)
    }
}
