//! Undo handlers for reversible tools.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use maple_autonomy_tools::{ProposedToolCall, ToolContract};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::error::{ExecutionError, PipelineError};

#[async_trait]
pub trait Compensation: Send + Sync {
    /// Undo the effect of `call`, which produced `output`.
    async fn compensate(&self, call: &ProposedToolCall, output: &Value) -> Result<(), ExecutionError>;
}

/// A reversible step that ran to completion.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletedStep {
    pub call: ProposedToolCall,
    pub output: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationStatus {
    Compensated,
    Failed,
    NoHandler,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompensationRecord {
    pub tool: String,
    pub request_id: String,
    pub status: CompensationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Default)]
pub struct CompensationRegistry {
    handlers: HashMap<String, Arc<dyn Compensation>>,
}

impl CompensationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only reversible contracts accept a handler.
    pub fn register(
        &mut self,
        contract: &ToolContract,
        handler: Arc<dyn Compensation>,
    ) -> Result<(), PipelineError> {
        if !contract.is_compensable() {
            return Err(PipelineError::NotCompensable {
                tool: contract.name.clone(),
                risk_class: contract.risk_class,
            });
        }
        self.handlers.insert(contract.name.clone(), handler);
        Ok(())
    }

    pub fn has(&self, tool: &str) -> bool {
        self.handlers.contains_key(tool)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Undo `completed` newest first. A failing handler is recorded and the
    /// rest still run.
    pub async fn compensate_all(&self, completed: &[CompletedStep]) -> Vec<CompensationRecord> {
        let mut records = Vec::with_capacity(completed.len());
        for step in completed.iter().rev() {
            let tool = step.call.tool.clone();
            let request_id = step.call.request_id.clone();
            let Some(handler) = self.handlers.get(&tool) else {
                records.push(CompensationRecord {
                    tool,
                    request_id,
                    status: CompensationStatus::NoHandler,
                    error: None,
                });
                continue;
            };
            match handler.compensate(&step.call, &step.output).await {
                Ok(()) => {
                    info!(%tool, %request_id, "Step compensated");
                    records.push(CompensationRecord {
                        tool,
                        request_id,
                        status: CompensationStatus::Compensated,
                        error: None,
                    });
                }
                Err(e) => {
                    error!(%tool, %request_id, error = %e, "Compensation failed");
                    records.push(CompensationRecord {
                        tool,
                        request_id,
                        status: CompensationStatus::Failed,
                        error: Some(e.to_string()),
                    });
                }
            }
        }
        records
    }
}

impl std::fmt::Debug for CompensationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tools: Vec<_> = self.handlers.keys().collect();
        tools.sort();
        f.debug_struct("CompensationRegistry").field("tools", &tools).finish()
    }
}
