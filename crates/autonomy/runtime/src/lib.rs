#![deny(unsafe_code)]
//! # maple-autonomy-runtime
//!
//! Glue between the governance core and a hosting agent runtime.
//!
//! - [`GovernanceConfig`]: TOML configuration, validated once at startup.
//! - [`GovernanceService`]: maps each [`RuntimeMessage`] to a trust source,
//!   runs the memory gate, and writes the result to a [`MemoryStore`]
//!   (memory for `allow`, quarantine for `quarantine`).
//! - [`DriftSession`]: one persona drift monitor per agent session.
//! - [`EventSink`]: best-effort `trust:scored`, `memory:gated` and
//!   `identity:drift` events.

pub mod config;
pub mod error;
pub mod events;
pub mod message;
pub mod service;
pub mod session;
pub mod store;

pub use config::{
    ConfigIssue, DriftSection, GovernanceConfig, QuarantineSection, SourcePriors, StoreSection,
    TrustSection, MAX_EXPIRY_HOURS,
};
pub use error::{ConfigError, EventError, ServiceError, StoreError};
pub use events::{
    emit_best_effort, BroadcastSink, EventSink, GovernanceEvent, NoopSink, RecordingSink,
};
pub use message::{source_for_message, MessageContent, RuntimeMessage};
pub use service::{GatedMessage, GovernanceService};
pub use session::DriftSession;
pub use store::{
    InMemoryStore, MemoryRecord, MemoryStore, QuarantineRecord, QuarantineResolution,
    QuarantineStatus,
};
