#![deny(unsafe_code)]
//! # maple-autonomy-kernel
//!
//! The lifecycle of one proposed action as a deterministic, synchronous
//! finite-state machine:
//!
//! ```text
//! idle ─▶ planning ─▶ idle
//! idle ─▶ awaiting_approval ─▶ executing ─▶ verifying ─▶ idle
//! idle ─▶ executing ─▶ verifying ─▶ error ─▶ idle
//! idle ─▶ writing_memory ─▶ idle | error
//! idle ─▶ auditing ─▶ idle | error
//! * ─[fatal_error]▶ error      * ─[escalate_safe_mode]▶ safe_mode
//! ```
//!
//! Every `(state, trigger)` pair either transitions or is rejected with a
//! reason. Three consecutive entries into `error` escalate to `safe_mode`,
//! which only `safe_mode_exit` leaves.
//!
//! The machine is not `Sync`; run one instance per in-flight action.

pub mod error;
pub mod machine;
pub mod types;

pub use error::KernelError;
pub use machine::{KernelStateMachine, ListenerId, DEFAULT_HISTORY_CAPACITY, MAX_CONSECUTIVE_ERRORS};
pub use types::{next_state, KernelState, KernelTrigger, StateChange, TransitionRecord, TransitionResult};
