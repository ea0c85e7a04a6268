use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::risk::{RiskClass, RiskClassifier};
use crate::schema::{ParamSchema, ParamSpec};

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEffect {
    pub description: String,
    pub resource: String,
    pub reversible: bool,
}

impl SideEffect {
    pub fn new(description: impl Into<String>, resource: impl Into<String>, reversible: bool) -> Self {
        Self {
            description: description.into(),
            resource: resource.into(),
            reversible,
        }
    }
}

/// Everything the kernel knows about a tool before running it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolContract {
    pub name: String,
    pub description: String,
    pub version: String,
    pub risk_class: RiskClass,
    pub params_schema: ParamSchema,
    pub required_permissions: Vec<String>,
    pub side_effects: Vec<SideEffect>,
    pub requires_approval: bool,
    pub timeout_ms: u64,
    pub tags: Vec<String>,
}

impl ToolContract {
    pub fn builder(name: impl Into<String>) -> ToolContractBuilder {
        ToolContractBuilder {
            name: name.into(),
            description: String::new(),
            version: "1.0.0".into(),
            risk_class: None,
            params_schema: ParamSchema::new(),
            required_permissions: Vec::new(),
            side_effects: Vec::new(),
            requires_approval: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            tags: Vec::new(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn is_compensable(&self) -> bool {
        self.risk_class == RiskClass::Reversible
    }
}

pub struct ToolContractBuilder {
    name: String,
    description: String,
    version: String,
    risk_class: Option<RiskClass>,
    params_schema: ParamSchema,
    required_permissions: Vec<String>,
    side_effects: Vec<SideEffect>,
    requires_approval: bool,
    timeout_ms: u64,
    tags: Vec<String>,
}

impl ToolContractBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Declare a semantic risk tier. It can raise, never lower, the tier
    /// implied by the permissions.
    pub fn risk(mut self, risk: RiskClass) -> Self {
        self.risk_class = Some(risk);
        self
    }

    pub fn param(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.params_schema.fields.insert(name.into(), spec);
        self
    }

    pub fn schema(mut self, schema: ParamSchema) -> Self {
        self.params_schema = schema;
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.required_permissions.push(permission.into());
        self
    }

    pub fn side_effect(mut self, effect: SideEffect) -> Self {
        self.side_effects.push(effect);
        self
    }

    pub fn requires_approval(mut self, required: bool) -> Self {
        self.requires_approval = required;
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Irreversible contracts always require approval.
    pub fn build(self) -> Result<ToolContract, ToolError> {
        self.build_with(&RiskClassifier::default())
    }

    pub fn build_with(self, classifier: &RiskClassifier) -> Result<ToolContract, ToolError> {
        let invalid = |reason: &str| ToolError::InvalidContract {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.timeout_ms == 0 {
            return Err(invalid("timeout must be positive"));
        }

        let derived = classifier.classify(&self.required_permissions);
        let risk_class = self.risk_class.map_or(derived, |declared| declared.max(derived));

        Ok(ToolContract {
            requires_approval: self.requires_approval || risk_class == RiskClass::Irreversible,
            name: self.name,
            description: self.description,
            version: self.version,
            risk_class,
            params_schema: self.params_schema,
            required_permissions: self.required_permissions,
            side_effects: self.side_effects,
            timeout_ms: self.timeout_ms,
            tags: self.tags,
        })
    }
}
