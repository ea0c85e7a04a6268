//! Sequencing of a multi-step plan through the kernel state machine.

use std::sync::Arc;
use std::time::Duration;

use maple_autonomy_kernel::{KernelState, KernelStateMachine, KernelTrigger, TransitionResult};
use maple_autonomy_tools::{
    CallAssessment, CallVerdict, FieldError, ProposedToolCall, RiskClass, SchemaValidator,
    ToolRegistry,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::approval::{ApprovalGate, ApprovalOutcome, ApprovalRequest};
use crate::compensation::{CompensationRecord, CompensationRegistry, CompletedStep};
use crate::error::PipelineError;
use crate::executor::ToolExecutor;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPlan {
    pub id: String,
    pub steps: Vec<ProposedToolCall>,
}

impl ActionPlan {
    pub fn new(steps: Vec<ProposedToolCall>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            steps,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    Invalid,
    Skipped,
    ApprovalDenied,
    ApprovalExpired,
    Failed,
    TimedOut,
    VerificationFailed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub tool: String,
    pub request_id: String,
    pub risk_class: Option<RiskClass>,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineOutcome {
    Completed,
    PlanRejected,
    ApprovalDenied,
    ApprovalExpired,
    ExecutionFailed,
    VerificationFailed,
    SafeMode,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub plan_id: String,
    pub outcome: PipelineOutcome,
    pub steps: Vec<StepReport>,
    pub compensations: Vec<CompensationRecord>,
    pub final_state: KernelState,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        self.outcome == PipelineOutcome::Completed
    }
}

/// One validated step with everything needed to run it.
struct StagedStep {
    call: ProposedToolCall,
    assessment: CallAssessment,
    timeout: Duration,
    compensable: bool,
}

impl StagedStep {
    fn report(&self, status: StepStatus) -> StepReport {
        StepReport {
            tool: self.call.tool.clone(),
            request_id: self.call.request_id.clone(),
            risk_class: self.assessment.risk_class,
            status,
            errors: self.assessment.validation.errors.clone(),
            detail: None,
            output: None,
        }
    }
}

enum StepResult {
    Succeeded(Value),
    Halted {
        status: StepStatus,
        outcome: PipelineOutcome,
        detail: Option<String>,
    },
}

impl StepResult {
    fn halted(status: StepStatus, outcome: PipelineOutcome, detail: Option<String>) -> Self {
        Self::Halted {
            status,
            outcome,
            detail,
        }
    }
}

/// Runs plans one at a time against a single kernel state machine.
///
/// Per plan: `plan_requested`, then `plan_approved` once every step
/// validates (`plan_rejected` otherwise). Per step: `approval_required` and
/// the gate's answer, or `tool_validated`; then execution under the contract
/// timeout and verification. The first failing step halts the plan, undoes
/// completed reversible steps newest first, and recovers the kernel unless
/// the failure pushed it into safe mode. A fully successful plan ends with
/// an audit pass.
pub struct ExecutionPipeline {
    registry: ToolRegistry,
    machine: KernelStateMachine,
    approvals: Arc<dyn ApprovalGate>,
    executor: Arc<dyn ToolExecutor>,
    compensations: CompensationRegistry,
}

impl ExecutionPipeline {
    pub fn new(
        registry: ToolRegistry,
        approvals: Arc<dyn ApprovalGate>,
        executor: Arc<dyn ToolExecutor>,
    ) -> Self {
        Self {
            registry,
            machine: KernelStateMachine::new(),
            approvals,
            executor,
            compensations: CompensationRegistry::new(),
        }
    }

    pub fn with_compensations(mut self, compensations: CompensationRegistry) -> Self {
        self.compensations = compensations;
        self
    }

    /// Use a pre-configured machine, e.g. one with listeners attached.
    pub fn with_machine(mut self, machine: KernelStateMachine) -> Self {
        self.machine = machine;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ToolRegistry {
        &mut self.registry
    }

    pub fn machine(&self) -> &KernelStateMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut KernelStateMachine {
        &mut self.machine
    }

    pub fn exit_safe_mode(&mut self) -> Result<TransitionResult, PipelineError> {
        let result = self.fire(KernelTrigger::SafeModeExit)?;
        info!("Kernel left safe mode");
        Ok(result)
    }

    pub async fn run(&mut self, plan: &ActionPlan) -> Result<PipelineReport, PipelineError> {
        if self.machine.state() == KernelState::SafeMode {
            return Err(PipelineError::SafeMode);
        }

        self.fire(KernelTrigger::PlanRequested)?;
        let staged = self.stage(plan);

        if staged
            .iter()
            .any(|s| s.assessment.verdict == CallVerdict::Reject)
        {
            self.fire(KernelTrigger::PlanRejected)?;
            let steps = staged
                .iter()
                .map(|s| {
                    let status = if s.assessment.validation.valid {
                        StepStatus::Skipped
                    } else {
                        StepStatus::Invalid
                    };
                    s.report(status)
                })
                .collect();
            warn!(plan_id = %plan.id, "Plan rejected: invalid tool calls");
            return Ok(self.report(plan, PipelineOutcome::PlanRejected, steps, Vec::new()));
        }
        self.fire(KernelTrigger::PlanApproved)?;

        let mut steps = Vec::with_capacity(staged.len());
        let mut completed: Vec<CompletedStep> = Vec::new();

        for (index, step) in staged.iter().enumerate() {
            match self.run_step(step).await? {
                StepResult::Succeeded(output) => {
                    if step.compensable {
                        completed.push(CompletedStep {
                            call: step.call.clone(),
                            output: output.clone(),
                        });
                    }
                    let mut report = step.report(StepStatus::Succeeded);
                    report.output = Some(output);
                    steps.push(report);
                }
                StepResult::Halted {
                    status,
                    outcome,
                    detail,
                } => {
                    let mut report = step.report(status);
                    report.detail = detail;
                    steps.push(report);
                    steps.extend(staged[index + 1..].iter().map(|s| s.report(StepStatus::Skipped)));

                    let compensations = self.compensations.compensate_all(&completed).await;
                    if self.machine.state() == KernelState::Error {
                        self.fire(KernelTrigger::Recover)?;
                    }
                    let outcome = if self.machine.state() == KernelState::SafeMode {
                        PipelineOutcome::SafeMode
                    } else {
                        outcome
                    };
                    warn!(plan_id = %plan.id, tool = %step.call.tool, ?outcome, "Plan halted");
                    return Ok(self.report(plan, outcome, steps, compensations));
                }
            }
        }

        self.fire(KernelTrigger::AuditRequested)?;
        info!(plan_id = %plan.id, steps = steps.len(), "Plan completed");
        self.fire(KernelTrigger::AuditComplete)?;

        Ok(self.report(plan, PipelineOutcome::Completed, steps, Vec::new()))
    }

    fn stage(&self, plan: &ActionPlan) -> Vec<StagedStep> {
        let validator = SchemaValidator::new(&self.registry);
        plan.steps
            .iter()
            .map(|call| {
                let contract = self.registry.get(&call.tool);
                StagedStep {
                    call: call.clone(),
                    assessment: validator.assess(call),
                    timeout: Duration::from_millis(contract.map_or(0, |c| c.timeout_ms)),
                    compensable: contract.is_some_and(|c| c.is_compensable()),
                }
            })
            .collect()
    }

    async fn run_step(&mut self, step: &StagedStep) -> Result<StepResult, PipelineError> {
        let call = &step.call;

        if step.assessment.requires_approval {
            self.fire(KernelTrigger::ApprovalRequired)?;
            let request = ApprovalRequest::for_call(call, step.assessment.risk_class);
            let outcome = match self.approvals.request(request).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(tool = %call.tool, error = %e, "Approval gate failed, denying");
                    ApprovalOutcome::Denied
                }
            };
            match outcome {
                ApprovalOutcome::Granted => {
                    self.fire(KernelTrigger::ApprovalGranted)?;
                }
                ApprovalOutcome::Denied => {
                    self.fire(KernelTrigger::ApprovalDenied)?;
                    return Ok(StepResult::halted(
                        StepStatus::ApprovalDenied,
                        PipelineOutcome::ApprovalDenied,
                        None,
                    ));
                }
                ApprovalOutcome::Expired => {
                    self.fire(KernelTrigger::ApprovalExpired)?;
                    return Ok(StepResult::halted(
                        StepStatus::ApprovalExpired,
                        PipelineOutcome::ApprovalExpired,
                        None,
                    ));
                }
            }
        } else {
            self.fire(KernelTrigger::ToolValidated)?;
        }

        let result = tokio::time::timeout(step.timeout, self.executor.execute(call)).await;
        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                self.fire(KernelTrigger::FatalError)?;
                return Ok(StepResult::halted(
                    StepStatus::Failed,
                    PipelineOutcome::ExecutionFailed,
                    Some(e.to_string()),
                ));
            }
            Err(_) => {
                self.fire(KernelTrigger::FatalError)?;
                return Ok(StepResult::halted(
                    StepStatus::TimedOut,
                    PipelineOutcome::ExecutionFailed,
                    Some(format!("timed out after {}ms", step.timeout.as_millis())),
                ));
            }
        };
        self.fire(KernelTrigger::ExecutionComplete)?;

        if self.executor.verify(call, &output).await {
            self.fire(KernelTrigger::VerificationPassed)?;
            Ok(StepResult::Succeeded(output))
        } else {
            self.fire(KernelTrigger::VerificationFailed)?;
            Ok(StepResult::halted(
                StepStatus::VerificationFailed,
                PipelineOutcome::VerificationFailed,
                None,
            ))
        }
    }

    fn fire(&mut self, trigger: KernelTrigger) -> Result<TransitionResult, PipelineError> {
        let result = self.machine.transition(trigger);
        if result.accepted {
            Ok(result)
        } else {
            Err(PipelineError::TransitionRejected {
                trigger,
                state: result.from,
                reason: result.reason.unwrap_or_default(),
            })
        }
    }

    fn report(
        &self,
        plan: &ActionPlan,
        outcome: PipelineOutcome,
        steps: Vec<StepReport>,
        compensations: Vec<CompensationRecord>,
    ) -> PipelineReport {
        PipelineReport {
            plan_id: plan.id.clone(),
            outcome,
            steps,
            compensations,
            final_state: self.machine.state(),
        }
    }
}
