#[path = "adversarial/trust_laundering.rs"]
mod trust_laundering;

#[path = "adversarial/identity_tampering.rs"]
mod identity_tampering;

#[path = "adversarial/tool_smuggling.rs"]
mod tool_smuggling;
