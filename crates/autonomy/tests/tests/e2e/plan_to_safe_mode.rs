//! End-to-end test: action plans through the tool registry, the approval
//! gate and the kernel state machine.
//!
//! Repeated verification failures must park the kernel in safe mode, and an
//! irreversible tool must never run without an explicit grant.

use std::sync::Arc;

use async_trait::async_trait;
use maple_autonomy_kernel::{KernelState, KernelStateMachine, KernelTrigger, StateChange};
use maple_autonomy_pipeline::{
    ActionPlan, ApprovalOutcome, ExecutionError, ExecutionPipeline, PipelineError,
    PipelineOutcome, SimulatedApprovalGate, StepStatus, ToolExecutor,
};
use maple_autonomy_tools::{CallSource, ProposedToolCall, ToolRegistry};
use parking_lot::Mutex;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Records every call; output is accepted unless `reject_output` is set.
#[derive(Default)]
struct RecordingExecutor {
    reject_output: bool,
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ToolExecutor for RecordingExecutor {
    async fn execute(&self, call: &ProposedToolCall) -> Result<Value, ExecutionError> {
        self.calls.lock().push(call.tool.clone());
        Ok(json!({"ok": true}))
    }

    async fn verify(&self, _call: &ProposedToolCall, _output: &Value) -> bool {
        !self.reject_output
    }
}

fn step(tool: &str, params: Value) -> ProposedToolCall {
    ProposedToolCall::new(tool, params, CallSource::System)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn kernel_escalates_on_third_verification_failure() {
    let mut machine = KernelStateMachine::new();
    let seen = Arc::new(Mutex::new(Vec::<StateChange>::new()));
    let sink = seen.clone();
    machine.subscribe(move |change| sink.lock().push(*change));

    for round in 1..=3 {
        assert!(machine.transition(KernelTrigger::ToolValidated).accepted);
        assert!(machine.transition(KernelTrigger::ExecutionComplete).accepted);
        let failed = machine.transition(KernelTrigger::VerificationFailed);
        assert!(failed.accepted);
        if round < 3 {
            assert!(!failed.escalated);
            assert_eq!(machine.state(), KernelState::Error);
            assert!(machine.transition(KernelTrigger::Recover).accepted);
        } else {
            assert!(failed.escalated);
            assert_eq!(failed.to, KernelState::SafeMode);
        }
    }

    assert_eq!(machine.state(), KernelState::SafeMode);
    let rejected = machine.transition(KernelTrigger::PlanRequested);
    assert!(!rejected.accepted);
    assert!(rejected.reason.is_some());

    let last = *seen.lock().last().unwrap();
    assert_eq!(last.to, KernelState::SafeMode);
    assert_eq!(last.trigger, KernelTrigger::EscalateSafeMode);

    assert!(machine.transition(KernelTrigger::SafeModeExit).accepted);
    assert_eq!(machine.consecutive_errors(), 0);
    assert!(machine.is_idle());
}

#[tokio::test]
async fn pipeline_parks_in_safe_mode_after_three_failed_runs() {
    let executor = Arc::new(RecordingExecutor {
        reject_output: true,
        ..Default::default()
    });
    let mut pipeline = ExecutionPipeline::new(
        ToolRegistry::with_builtins(),
        Arc::new(SimulatedApprovalGate::new()),
        executor.clone(),
    );
    let plan = || ActionPlan::new(vec![step("WRITE_MEMORY", json!({"content": "note"}))]);

    for _ in 0..2 {
        let report = pipeline.run(&plan()).await.unwrap();
        assert_eq!(report.outcome, PipelineOutcome::VerificationFailed);
        assert_eq!(report.steps[0].status, StepStatus::VerificationFailed);
    }
    let report = pipeline.run(&plan()).await.unwrap();
    assert_eq!(report.outcome, PipelineOutcome::SafeMode);
    assert_eq!(report.final_state, KernelState::SafeMode);
    assert_eq!(executor.calls.lock().len(), 3);

    let refused = pipeline.run(&plan()).await;
    assert!(matches!(refused, Err(PipelineError::SafeMode)));
    assert_eq!(executor.calls.lock().len(), 3);

    pipeline.exit_safe_mode().unwrap();
    assert!(pipeline.machine().is_idle());
}

#[tokio::test]
async fn irreversible_step_waits_for_a_grant() {
    let executor = Arc::new(RecordingExecutor::default());
    let gate = Arc::new(SimulatedApprovalGate::new());
    let mut pipeline = ExecutionPipeline::new(
        ToolRegistry::with_builtins(),
        gate.clone(),
        executor.clone(),
    );
    let plan = || {
        ActionPlan::new(vec![
            step("SEARCH_MEMORY", json!({"query": "disk usage"})),
            step("RUN_SHELL_COMMAND", json!({"command": "df -h"})),
        ])
    };

    // nobody answers: the shell command expires unexecuted
    let report = pipeline.run(&plan()).await.unwrap();
    assert_eq!(report.outcome, PipelineOutcome::ApprovalExpired);
    assert_eq!(report.steps[1].status, StepStatus::ApprovalExpired);
    assert_eq!(*executor.calls.lock(), vec!["SEARCH_MEMORY"]);
    assert!(pipeline.machine().is_idle());

    gate.decide("RUN_SHELL_COMMAND", ApprovalOutcome::Granted);
    let report = pipeline.run(&plan()).await.unwrap();
    assert!(report.succeeded());
    assert_eq!(
        *executor.calls.lock(),
        vec!["SEARCH_MEMORY", "SEARCH_MEMORY", "RUN_SHELL_COMMAND"]
    );
    assert_eq!(gate.requests().len(), 2);
    assert!(gate.requests().iter().all(|r| r.tool == "RUN_SHELL_COMMAND"));
}
