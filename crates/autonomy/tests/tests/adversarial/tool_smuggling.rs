//! Adversarial test: tool calls cannot slip past their contracts.
//!
//! Unknown tools, undeclared fields and harmless-sounding names for
//! dangerous actions must never reach the executor unreviewed.

use std::sync::Arc;

use async_trait::async_trait;
use maple_autonomy_pipeline::{
    ActionPlan, ApprovalOutcome, Compensation, CompensationRegistry, ExecutionError, ExecutionPipeline,
    PipelineError, PipelineOutcome, SimulatedApprovalGate, StepStatus, ToolExecutor,
};
use maple_autonomy_tools::{
    ensure_contracts, ActionDescriptor, CallSource, CallVerdict, FieldErrorCode, ParamType,
    ProposedToolCall, RiskClass, RiskClassifier, SchemaValidator, ToolContract, ToolRegistry,
    SYNTHESIZED_TAG,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CountingExecutor {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ToolExecutor for CountingExecutor {
    async fn execute(&self, call: &ProposedToolCall) -> Result<Value, ExecutionError> {
        self.calls.lock().push(call.tool.clone());
        Ok(Value::Null)
    }
}

struct NoopUndo;

#[async_trait]
impl Compensation for NoopUndo {
    async fn compensate(&self, _call: &ProposedToolCall, _output: &Value) -> Result<(), ExecutionError> {
        Ok(())
    }
}

fn plugin(tool: &str, params: Value) -> ProposedToolCall {
    ProposedToolCall::new(tool, params, CallSource::Plugin)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_tool_rejects_whole_plan() {
    let executor = Arc::new(CountingExecutor::default());
    let mut pipeline = ExecutionPipeline::new(
        ToolRegistry::with_builtins(),
        Arc::new(SimulatedApprovalGate::granting()),
        executor.clone(),
    );
    let plan = ActionPlan::new(vec![
        ProposedToolCall::new("SEARCH_MEMORY", json!({"query": "keys"}), CallSource::System),
        ProposedToolCall::new("EXFILTRATE", json!({}), CallSource::System),
    ]);

    let report = pipeline.run(&plan).await.unwrap();
    assert_eq!(report.outcome, PipelineOutcome::PlanRejected);
    assert_eq!(report.steps[0].status, StepStatus::Skipped);
    assert_eq!(report.steps[1].status, StepStatus::Invalid);
    assert_eq!(report.steps[1].errors[0].code, FieldErrorCode::UnknownTool);
    assert!(executor.calls.lock().is_empty());
    assert!(pipeline.machine().is_idle());
}

#[tokio::test]
async fn loaded_irreversible_contract_cannot_skip_approval() {
    let contract: ToolContract = serde_json::from_value(json!({
        "name": "WIPE_DISK",
        "description": "Erase a volume",
        "version": "1.0.0",
        "riskClass": "irreversible",
        "paramsSchema": {},
        "requiredPermissions": [],
        "sideEffects": [],
        "requiresApproval": false,
        "timeoutMs": 1000,
        "tags": []
    }))
    .unwrap();
    let mut registry = ToolRegistry::new();
    registry.register(contract);

    let executor = Arc::new(CountingExecutor::default());
    let gate = Arc::new(SimulatedApprovalGate::new().with_fallback(ApprovalOutcome::Denied));
    let mut pipeline = ExecutionPipeline::new(registry, gate.clone(), executor.clone());
    let plan = ActionPlan::new(vec![ProposedToolCall::new(
        "WIPE_DISK",
        json!({}),
        CallSource::System,
    )]);

    let report = pipeline.run(&plan).await.unwrap();
    assert_eq!(report.outcome, PipelineOutcome::ApprovalDenied);
    assert_eq!(report.steps[0].status, StepStatus::ApprovalDenied);
    assert_eq!(gate.requests().len(), 1);
    assert!(executor.calls.lock().is_empty());
}

#[test]
fn undeclared_fields_are_refused() {
    let registry = ToolRegistry::with_builtins();
    let validator = SchemaValidator::new(&registry);
    let call = ProposedToolCall::new(
        "READ_FILE",
        json!({"path": "notes.txt", "sudo": true}),
        CallSource::System,
    );

    let assessment = validator.assess(&call);
    assert_eq!(assessment.verdict, CallVerdict::Reject);
    assert!(assessment.validation.has_code(FieldErrorCode::UnknownField));
    assert_eq!(assessment.validation.errors[0].field, "sudo");
}

#[test]
fn non_object_params_are_refused() {
    let registry = ToolRegistry::with_builtins();
    let validator = SchemaValidator::new(&registry);
    let call = ProposedToolCall::new("RUN_SHELL_COMMAND", json!("rm -rf /"), CallSource::System);

    let result = validator.validate(&call);
    assert!(!result.valid);
    assert!(result.has_code(FieldErrorCode::NotAnObject));
}

#[test]
fn plugin_needs_approval_for_anything_that_writes() {
    let registry = ToolRegistry::with_builtins();
    let validator = SchemaValidator::new(&registry);

    let write = validator.assess(&plugin("WRITE_MEMORY", json!({"content": "x"})));
    assert_eq!(write.verdict, CallVerdict::RequireApproval);

    let read = validator.assess(&plugin("SEARCH_MEMORY", json!({"query": "x"})));
    assert_eq!(read.verdict, CallVerdict::Execute);
}

#[test]
fn benign_name_cannot_hide_a_dangerous_permission() {
    let mut registry = ToolRegistry::new();
    let actions = [
        ActionDescriptor::new("UPDATE_USER_TOKEN").param("token", ParamType::String, true),
        ActionDescriptor::new("GET_WEATHER").param("city", ParamType::String, true),
    ];
    let synthesized = ensure_contracts(&mut registry, &actions, &RiskClassifier::new());
    assert_eq!(synthesized, vec!["UPDATE_USER_TOKEN", "GET_WEATHER"]);

    let token = registry.get("UPDATE_USER_TOKEN").unwrap();
    assert_eq!(token.risk_class, RiskClass::Irreversible);
    assert!(token.requires_approval);
    assert!(token.has_tag(SYNTHESIZED_TAG));

    let weather = registry.get("GET_WEATHER").unwrap();
    assert_eq!(weather.risk_class, RiskClass::ReadOnly);
    assert!(!weather.requires_approval);

    let again = ensure_contracts(&mut registry, &actions, &RiskClassifier::new());
    assert!(again.is_empty());
}

#[test]
fn irreversible_tools_cannot_claim_compensation() {
    let registry = ToolRegistry::with_builtins();
    let mut compensations = CompensationRegistry::new();

    let shell = registry.get("RUN_SHELL_COMMAND").unwrap();
    let err = compensations.register(shell, Arc::new(NoopUndo)).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::NotCompensable { risk_class: RiskClass::Irreversible, .. }
    ));

    let message = registry.get("SEND_MESSAGE").unwrap();
    compensations.register(message, Arc::new(NoopUndo)).unwrap();
    assert!(compensations.has("SEND_MESSAGE"));
    assert_eq!(compensations.len(), 1);
}
