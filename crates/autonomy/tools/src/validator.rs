//! Pre-execution validation of proposed tool calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::registry::ToolRegistry;
use crate::risk::RiskClass;
use crate::schema::{json_type_name, ParamSchema};

/// Where a proposed call came from. Non-system callers need approval for
/// anything beyond read-only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallSource {
    System,
    User,
    Plugin,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedToolCall {
    pub tool: String,
    pub params: Value,
    pub source: CallSource,
    pub request_id: String,
}

impl ProposedToolCall {
    pub fn new(tool: impl Into<String>, params: Value, source: CallSource) -> Self {
        Self {
            tool: tool.into(),
            params,
            source,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorCode {
    Missing,
    TypeMismatch,
    NotInEnum,
    UnknownField,
    NotAnObject,
    UnknownTool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub code: FieldErrorCode,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, code: FieldErrorCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub tool: String,
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    fn from_errors(tool: &str, errors: Vec<FieldError>) -> Self {
        Self {
            valid: errors.is_empty(),
            tool: tool.to_string(),
            errors,
        }
    }

    pub fn has_code(&self, code: FieldErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }
}

/// Check `params` against a closed-world schema, collecting every problem.
///
/// `null` counts as absent: fine for optional fields, missing for required.
pub fn validate_params(schema: &ParamSchema, params: &Value) -> Vec<FieldError> {
    let object = match params {
        Value::Object(map) => map,
        Value::Null => {
            return schema
                .required_fields()
                .map(missing)
                .collect();
        }
        other => {
            return vec![FieldError::new(
                "",
                FieldErrorCode::NotAnObject,
                format!("params must be an object, got {}", json_type_name(other)),
            )];
        }
    };

    let mut errors = Vec::new();

    for (name, spec) in &schema.fields {
        let value = match object.get(name) {
            None | Some(Value::Null) => {
                if spec.required {
                    errors.push(missing(name));
                }
                continue;
            }
            Some(value) => value,
        };
        if !spec.param_type.matches(value) {
            errors.push(FieldError::new(
                name.as_str(),
                FieldErrorCode::TypeMismatch,
                format!("expected {}, got {}", spec.param_type, json_type_name(value)),
            ));
            continue;
        }
        if let Some(allowed) = &spec.enum_values {
            if !allowed.contains(value) {
                errors.push(FieldError::new(
                    name.as_str(),
                    FieldErrorCode::NotInEnum,
                    format!("{value} is not one of {}", Value::Array(allowed.clone())),
                ));
            }
        }
    }

    // serde_json::Map iterates in key order, so this is deterministic
    for name in object.keys() {
        if schema.get(name).is_none() {
            errors.push(FieldError::new(
                name.as_str(),
                FieldErrorCode::UnknownField,
                "field is not declared by the tool contract",
            ));
        }
    }

    errors
}

fn missing(name: &str) -> FieldError {
    FieldError::new(name, FieldErrorCode::Missing, "required field is missing")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallVerdict {
    Execute,
    RequireApproval,
    Reject,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallAssessment {
    pub validation: ValidationResult,
    pub risk_class: Option<RiskClass>,
    pub requires_approval: bool,
    pub verdict: CallVerdict,
}

/// Validates calls against the contracts in a registry.
pub struct SchemaValidator<'a> {
    registry: &'a ToolRegistry,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(registry: &'a ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn validate(&self, call: &ProposedToolCall) -> ValidationResult {
        let errors = match self.registry.get(&call.tool) {
            Some(contract) => validate_params(&contract.params_schema, &call.params),
            None => vec![FieldError::new(
                "",
                FieldErrorCode::UnknownTool,
                format!("no contract registered for {}", call.tool),
            )],
        };
        let result = ValidationResult::from_errors(&call.tool, errors);
        if !result.valid {
            debug!(
                tool = %call.tool,
                request_id = %call.request_id,
                errors = result.errors.len(),
                "Tool call failed validation"
            );
        }
        result
    }

    /// Validation plus the approval decision.
    ///
    /// Invalid calls are rejected. Valid calls need approval when the
    /// contract says so, when the tool is irreversible, or when a
    /// non-system source asks for anything beyond read-only.
    pub fn assess(&self, call: &ProposedToolCall) -> CallAssessment {
        let validation = self.validate(call);
        let contract = self.registry.get(&call.tool);
        let risk_class = contract.map(|c| c.risk_class);

        let requires_approval = contract.is_some_and(|c| {
            c.requires_approval
                || c.risk_class == RiskClass::Irreversible
                || (call.source != CallSource::System && c.risk_class > RiskClass::ReadOnly)
        });

        let verdict = if !validation.valid {
            CallVerdict::Reject
        } else if requires_approval {
            CallVerdict::RequireApproval
        } else {
            CallVerdict::Execute
        };

        CallAssessment {
            validation,
            risk_class,
            requires_approval,
            verdict,
        }
    }
}
