#![deny(unsafe_code)]
//! # maple-autonomy-tools
//!
//! Everything an executor asks before running a tool:
//!
//! - [`RiskClassifier`] maps declared permissions to a [`RiskClass`].
//! - [`ToolRegistry`] stores one [`ToolContract`] per tool name, with
//!   [`builtin_contracts`] for the agent's own actions and
//!   [`synthesize_contract`] for actions that arrive without one.
//! - [`SchemaValidator`] checks a [`ProposedToolCall`] against its contract
//!   (closed-world: undeclared fields are errors) and [`SchemaValidator::assess`]
//!   folds in the risk tier to decide whether the call may run, needs
//!   approval, or is refused.

pub mod builtin;
pub mod contract;
pub mod error;
pub mod registry;
pub mod risk;
pub mod schema;
pub mod synthesis;
pub mod validator;

pub use builtin::builtin_contracts;
pub use contract::{SideEffect, ToolContract, ToolContractBuilder};
pub use error::ToolError;
pub use registry::ToolRegistry;
pub use risk::{RiskClass, RiskClassifier, DANGEROUS_PERMISSIONS, WRITE_SEGMENTS};
pub use schema::{ParamSchema, ParamSpec, ParamType};
pub use synthesis::{
    ensure_contracts, infer_permissions, infer_risk_from_name, synthesize_contract,
    ActionDescriptor, ActionParameter, SYNTHESIZED_TAG,
};
pub use validator::{
    validate_params, CallAssessment, CallSource, CallVerdict, FieldError, FieldErrorCode,
    ProposedToolCall, SchemaValidator, ValidationResult,
};
