#![deny(unsafe_code)]
//! # maple-autonomy-pipeline
//!
//! Thin coordination layer over the kernel state machine and the tool
//! registry. [`ExecutionPipeline`] validates every step of an
//! [`ActionPlan`] up front, routes approval-requiring calls through an
//! [`ApprovalGate`], runs each call on a [`ToolExecutor`] under its contract
//! timeout, and on failure undoes completed reversible steps through the
//! [`CompensationRegistry`].
//!
//! An irreversible call never reaches the executor unless the gate answered
//! [`ApprovalOutcome::Granted`].

pub mod approval;
pub mod compensation;
pub mod error;
pub mod executor;
pub mod pipeline;

pub use approval::{
    ApprovalGate, ApprovalOutcome, ApprovalRequest, ChannelApprovalGate, PendingApproval,
    SimulatedApprovalGate,
};
pub use compensation::{
    Compensation, CompensationRecord, CompensationRegistry, CompensationStatus, CompletedStep,
};
pub use error::{ApprovalError, ExecutionError, PipelineError};
pub use executor::ToolExecutor;
pub use pipeline::{
    ActionPlan, ExecutionPipeline, PipelineOutcome, PipelineReport, StepReport, StepStatus,
};
