//! Cross-crate tests for the autonomy governance kernel.
//!
//! - `tests/e2e`: inbound messages, action plans and identity updates
//!   flowing through several crates at once.
//! - `tests/property`: invariants checked with proptest.
//! - `tests/adversarial`: attempts to get content, calls or identity
//!   changes past the governance layer.
