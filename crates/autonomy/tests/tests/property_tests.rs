#[path = "property/trust_bounds.rs"]
mod trust_bounds;

#[path = "property/kernel_totality.rs"]
mod kernel_totality;

#[path = "property/identity_diff.rs"]
mod identity_diff;
