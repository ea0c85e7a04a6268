#![deny(unsafe_code)]
//! # maple-autonomy-drift
//!
//! Measures how far an agent's recent outputs have wandered from its
//! declared [`AutonomyIdentityConfig`](maple_autonomy_identity::AutonomyIdentityConfig).
//!
//! Four dimensions are scored over a bounded window of outputs:
//! value alignment, style consistency, boundary respect and topic focus.
//! A broken identity hash short-circuits to a critical report.
//!
//! Each [`PersonaDriftMonitor`] owns its own [`OutputWindow`]; run one per
//! agent session.

pub mod analysis;
pub mod config;
pub mod error;
pub mod monitor;
pub mod rules;
pub mod types;
pub mod window;

pub use analysis::{
    analyze_outputs, boundary_keywords, boundary_respect, style_consistency, topic_focus,
    value_alignment,
};
pub use config::DriftConfig;
pub use error::DriftError;
pub use monitor::PersonaDriftMonitor;
pub use types::{DriftDimensions, DriftReport, DriftSeverity};
pub use window::{OutputWindow, MAX_WINDOW};
