use maple_autonomy_kernel::{KernelState, KernelTrigger};
use maple_autonomy_tools::RiskClass;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApprovalError {
    #[error("Approval backend unavailable: {0}")]
    Unavailable(String),

    #[error("Approval request not found: {0}")]
    NotFound(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Tool {tool} failed: {reason}")]
    Failed { tool: String, reason: String },

    #[error("No executor for tool: {0}")]
    Unsupported(String),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Kernel is in safe mode; exit safe mode before running new plans")]
    SafeMode,

    #[error("Kernel rejected '{trigger}' in state '{state}': {reason}")]
    TransitionRejected {
        trigger: KernelTrigger,
        state: KernelState,
        reason: String,
    },

    #[error("Tool {tool} is {risk_class} and cannot be compensated")]
    NotCompensable { tool: String, risk_class: RiskClass },
}
