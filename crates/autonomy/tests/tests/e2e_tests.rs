#[path = "e2e/injection_to_memory.rs"]
mod injection_to_memory;

#[path = "e2e/plan_to_safe_mode.rs"]
mod plan_to_safe_mode;

#[path = "e2e/drift_session.rs"]
mod drift_session;

#[path = "e2e/identity_governance.rs"]
mod identity_governance;
