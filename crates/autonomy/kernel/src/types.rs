use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::KernelError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelState {
    Idle,
    Planning,
    AwaitingApproval,
    Executing,
    Verifying,
    WritingMemory,
    Auditing,
    Error,
    SafeMode,
}

impl KernelState {
    pub const ALL: [KernelState; 9] = [
        KernelState::Idle,
        KernelState::Planning,
        KernelState::AwaitingApproval,
        KernelState::Executing,
        KernelState::Verifying,
        KernelState::WritingMemory,
        KernelState::Auditing,
        KernelState::Error,
        KernelState::SafeMode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Planning => "planning",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Executing => "executing",
            Self::Verifying => "verifying",
            Self::WritingMemory => "writing_memory",
            Self::Auditing => "auditing",
            Self::Error => "error",
            Self::SafeMode => "safe_mode",
        }
    }
}

impl std::fmt::Display for KernelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KernelState {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| KernelError::UnknownState(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelTrigger {
    PlanRequested,
    PlanApproved,
    PlanRejected,
    ApprovalRequired,
    ApprovalGranted,
    ApprovalDenied,
    ApprovalExpired,
    ToolValidated,
    ExecutionComplete,
    VerificationPassed,
    VerificationFailed,
    WriteMemory,
    MemoryWritten,
    MemoryWriteFailed,
    AuditRequested,
    AuditComplete,
    AuditFailed,
    Recover,
    FatalError,
    EscalateSafeMode,
    SafeModeExit,
}

impl KernelTrigger {
    pub const ALL: [KernelTrigger; 21] = [
        KernelTrigger::PlanRequested,
        KernelTrigger::PlanApproved,
        KernelTrigger::PlanRejected,
        KernelTrigger::ApprovalRequired,
        KernelTrigger::ApprovalGranted,
        KernelTrigger::ApprovalDenied,
        KernelTrigger::ApprovalExpired,
        KernelTrigger::ToolValidated,
        KernelTrigger::ExecutionComplete,
        KernelTrigger::VerificationPassed,
        KernelTrigger::VerificationFailed,
        KernelTrigger::WriteMemory,
        KernelTrigger::MemoryWritten,
        KernelTrigger::MemoryWriteFailed,
        KernelTrigger::AuditRequested,
        KernelTrigger::AuditComplete,
        KernelTrigger::AuditFailed,
        KernelTrigger::Recover,
        KernelTrigger::FatalError,
        KernelTrigger::EscalateSafeMode,
        KernelTrigger::SafeModeExit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlanRequested => "plan_requested",
            Self::PlanApproved => "plan_approved",
            Self::PlanRejected => "plan_rejected",
            Self::ApprovalRequired => "approval_required",
            Self::ApprovalGranted => "approval_granted",
            Self::ApprovalDenied => "approval_denied",
            Self::ApprovalExpired => "approval_expired",
            Self::ToolValidated => "tool_validated",
            Self::ExecutionComplete => "execution_complete",
            Self::VerificationPassed => "verification_passed",
            Self::VerificationFailed => "verification_failed",
            Self::WriteMemory => "write_memory",
            Self::MemoryWritten => "memory_written",
            Self::MemoryWriteFailed => "memory_write_failed",
            Self::AuditRequested => "audit_requested",
            Self::AuditComplete => "audit_complete",
            Self::AuditFailed => "audit_failed",
            Self::Recover => "recover",
            Self::FatalError => "fatal_error",
            Self::EscalateSafeMode => "escalate_safe_mode",
            Self::SafeModeExit => "safe_mode_exit",
        }
    }
}

impl std::fmt::Display for KernelTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KernelTrigger {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|trigger| trigger.as_str() == s)
            .ok_or_else(|| KernelError::UnknownTrigger(s.to_string()))
    }
}

/// The fixed transition table. `None` means the trigger is not valid in
/// `from`.
pub fn next_state(from: KernelState, trigger: KernelTrigger) -> Option<KernelState> {
    use KernelState as S;
    use KernelTrigger as T;

    match (from, trigger) {
        // Wildcards
        (_, T::FatalError) => Some(S::Error),
        (_, T::EscalateSafeMode) => Some(S::SafeMode),

        // Planning
        (S::Idle, T::PlanRequested) => Some(S::Planning),
        (S::Planning, T::PlanApproved | T::PlanRejected) => Some(S::Idle),

        // Approval
        (S::Idle, T::ApprovalRequired) => Some(S::AwaitingApproval),
        (S::AwaitingApproval, T::ApprovalGranted) => Some(S::Executing),
        (S::AwaitingApproval, T::ApprovalDenied | T::ApprovalExpired) => Some(S::Idle),

        // Execution
        (S::Idle, T::ToolValidated) => Some(S::Executing),
        (S::Executing, T::ExecutionComplete) => Some(S::Verifying),
        (S::Verifying, T::VerificationPassed) => Some(S::Idle),
        (S::Verifying, T::VerificationFailed) => Some(S::Error),

        // Memory
        (S::Idle, T::WriteMemory) => Some(S::WritingMemory),
        (S::WritingMemory, T::MemoryWritten) => Some(S::Idle),
        (S::WritingMemory, T::MemoryWriteFailed) => Some(S::Error),

        // Audit
        (S::Idle, T::AuditRequested) => Some(S::Auditing),
        (S::Auditing, T::AuditComplete) => Some(S::Idle),
        (S::Auditing, T::AuditFailed) => Some(S::Error),

        // Recovery
        (S::Error, T::Recover) => Some(S::Idle),
        (S::SafeMode, T::SafeModeExit) => Some(S::Idle),

        _ => None,
    }
}

/// An accepted transition, as seen by listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub from: KernelState,
    pub to: KernelState,
    pub trigger: KernelTrigger,
}

/// Outcome of [`KernelStateMachine::transition`](crate::KernelStateMachine::transition).
///
/// On rejection `to == from`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResult {
    pub accepted: bool,
    pub from: KernelState,
    pub to: KernelState,
    pub trigger: KernelTrigger,
    pub reason: Option<String>,
    /// This call pushed the machine into safe mode via the error counter.
    pub escalated: bool,
}

/// Audit trail entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    pub from: KernelState,
    pub to: KernelState,
    pub trigger: KernelTrigger,
    pub accepted: bool,
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}
