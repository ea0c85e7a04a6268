//! Contracts for actions that were registered without one.
//!
//! Risk is inferred from the action name, permissions from name substrings,
//! and a strict schema from the declared parameters. Whatever the name
//! suggests, the permission-derived tier still applies as a floor.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::contract::ToolContract;
use crate::registry::ToolRegistry;
use crate::risk::{RiskClass, RiskClassifier};
use crate::schema::{ParamSchema, ParamSpec, ParamType};

pub const SYNTHESIZED_TAG: &str = "synthesized";

const READ_PREFIXES: &[&str] = &["GET_", "LIST_", "READ_"];
const REVERSIBLE_MARKERS: &[&str] = &["CREATE", "UPDATE", "GENERATE", "SEND"];

/// `(name substring, permission when read-only, permission otherwise)`.
const PERMISSION_HINTS: &[(&str, &str, &str)] = &[
    ("SHELL", "process:shell", "process:shell"),
    ("COMMAND", "process:shell", "process:shell"),
    ("EXEC", "process:shell", "process:shell"),
    ("FILE", "fs:read", "fs:write"),
    ("MEMORY", "memory:read", "memory:write"),
    ("MESSAGE", "message:read", "message:send"),
    ("EMAIL", "message:read", "message:send"),
    ("POST", "net:fetch", "net:outbound"),
    ("SEND", "message:read", "message:send"),
    ("RESTART", "process:spawn", "process:spawn"),
    ("SPAWN", "process:spawn", "process:spawn"),
    ("SECRET", "secrets:read", "secrets:write"),
    ("TOKEN", "secrets:read", "secrets:write"),
    ("ENV", "env:read", "env:write"),
    ("HTTP", "net:fetch", "net:outbound"),
    ("FETCH", "net:fetch", "net:fetch"),
    ("WEB", "net:fetch", "net:outbound"),
];

/// Declared parameter metadata for an action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionParameter {
    pub name: String,
    #[serde(rename = "type", default = "any_type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

fn any_type() -> ParamType {
    ParamType::Any
}

/// A callable action as the hosting runtime describes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ActionParameter>,
}

impl ActionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameters: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, param_type: ParamType, required: bool) -> Self {
        self.parameters.push(ActionParameter {
            name: name.into(),
            param_type,
            required,
            description: String::new(),
            enum_values: None,
        });
        self
    }
}

pub fn infer_risk_from_name(name: &str) -> RiskClass {
    let upper = name.to_uppercase();
    if READ_PREFIXES.iter().any(|p| upper.starts_with(p)) {
        RiskClass::ReadOnly
    } else if REVERSIBLE_MARKERS.iter().any(|m| upper.contains(m)) {
        RiskClass::Reversible
    } else {
        RiskClass::Irreversible
    }
}

/// Likely permissions, de-duplicated, in hint-table order.
pub fn infer_permissions(name: &str, risk: RiskClass) -> Vec<String> {
    let upper = name.to_uppercase();
    let mut out: Vec<String> = Vec::new();
    for (marker, read, write) in PERMISSION_HINTS {
        if !upper.contains(marker) {
            continue;
        }
        let permission = if risk == RiskClass::ReadOnly { read } else { write };
        if !out.iter().any(|p| p == permission) {
            out.push(permission.to_string());
        }
    }
    out
}

pub fn synthesize_contract(action: &ActionDescriptor, classifier: &RiskClassifier) -> ToolContract {
    let name_risk = infer_risk_from_name(&action.name);
    let permissions = infer_permissions(&action.name, name_risk);
    let risk_class = name_risk.max(classifier.classify(&permissions));

    let params_schema = action
        .parameters
        .iter()
        .fold(ParamSchema::new(), |schema, p| {
            schema.field(
                p.name.clone(),
                ParamSpec {
                    param_type: p.param_type,
                    required: p.required,
                    description: p.description.clone(),
                    enum_values: p.enum_values.clone(),
                },
            )
        });

    let description = if action.description.trim().is_empty() {
        format!("Synthesized contract for {}", action.name)
    } else {
        action.description.clone()
    };

    ToolContract {
        name: action.name.clone(),
        description,
        version: "0.0.0".into(),
        risk_class,
        params_schema,
        required_permissions: permissions,
        side_effects: Vec::new(),
        requires_approval: risk_class == RiskClass::Irreversible,
        timeout_ms: crate::contract::DEFAULT_TIMEOUT_MS,
        tags: vec![SYNTHESIZED_TAG.to_string()],
    }
}

/// Register a synthesized contract for every action the registry lacks.
/// Returns the names that were synthesized.
pub fn ensure_contracts<'a, I>(
    registry: &mut ToolRegistry,
    actions: I,
    classifier: &RiskClassifier,
) -> Vec<String>
where
    I: IntoIterator<Item = &'a ActionDescriptor>,
{
    let mut synthesized = Vec::new();
    for action in actions {
        if registry.has(&action.name) {
            continue;
        }
        let contract = synthesize_contract(action, classifier);
        info!(
            tool = %contract.name,
            risk = %contract.risk_class,
            "Synthesized tool contract"
        );
        synthesized.push(contract.name.clone());
        registry.register(contract);
    }
    synthesized
}
