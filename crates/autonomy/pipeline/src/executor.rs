use async_trait::async_trait;
use maple_autonomy_tools::ProposedToolCall;
use serde_json::Value;

use crate::error::ExecutionError;

/// Runs validated tool calls. The pipeline owns sequencing, approval and
/// timeouts; an executor only performs the effect.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, call: &ProposedToolCall) -> Result<Value, ExecutionError>;

    /// Post-execution check. Defaults to trusting the output.
    async fn verify(&self, _call: &ProposedToolCall, _output: &Value) -> bool {
        true
    }
}
