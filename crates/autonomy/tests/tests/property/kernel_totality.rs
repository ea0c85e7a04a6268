//! Property tests: the kernel state machine is total and deterministic.
//!
//! Any trigger sequence, from any state, either follows the transition
//! table or is rejected with a reason, and `error` is never a resting place
//! once the consecutive-error limit is reached.

use maple_autonomy_kernel::{
    next_state, KernelState, KernelStateMachine, KernelTrigger, MAX_CONSECUTIVE_ERRORS,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn arb_trigger() -> impl Strategy<Value = KernelTrigger> {
    prop::sample::select(KernelTrigger::ALL.to_vec())
}

fn arb_triggers(max: usize) -> impl Strategy<Value = Vec<KernelTrigger>> {
    prop::collection::vec(arb_trigger(), 0..max)
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Every transition agrees with the table; rejections leave state alone.
    #[test]
    fn transitions_follow_the_table(triggers in arb_triggers(64)) {
        let mut machine = KernelStateMachine::new();
        for trigger in triggers {
            let from = machine.state();
            let result = machine.transition(trigger);
            prop_assert_eq!(result.from, from);
            match next_state(from, trigger) {
                Some(expected) => {
                    prop_assert!(result.accepted);
                    prop_assert!(result.reason.is_none());
                    if result.escalated {
                        prop_assert_eq!(expected, KernelState::Error);
                        prop_assert_eq!(result.to, KernelState::SafeMode);
                    } else {
                        prop_assert_eq!(result.to, expected);
                    }
                }
                None => {
                    prop_assert!(!result.accepted);
                    prop_assert!(result.reason.is_some());
                    prop_assert_eq!(result.to, from);
                }
            }
            prop_assert_eq!(machine.state(), result.to);
        }
    }

    /// The machine never rests in `error` at the consecutive-error limit.
    #[test]
    fn error_limit_always_escalates(triggers in arb_triggers(64)) {
        let mut machine = KernelStateMachine::new();
        for trigger in triggers {
            machine.transition(trigger);
            if machine.state() == KernelState::Error {
                prop_assert!(machine.consecutive_errors() < MAX_CONSECUTIVE_ERRORS);
            }
        }
    }

    /// `allowed_triggers` is exactly the set the table accepts.
    #[test]
    fn allowed_triggers_match_table(triggers in arb_triggers(32)) {
        let mut machine = KernelStateMachine::new();
        for trigger in triggers {
            machine.transition(trigger);
        }
        let state = machine.state();
        for trigger in KernelTrigger::ALL {
            prop_assert_eq!(
                machine.allowed_triggers().contains(&trigger),
                next_state(state, trigger).is_some()
            );
            prop_assert_eq!(machine.can_accept(trigger), next_state(state, trigger).is_some());
        }
    }

    /// History is bounded and its newest record matches the latest result.
    #[test]
    fn history_is_bounded(triggers in arb_triggers(64), capacity in 1usize..16) {
        let mut machine = KernelStateMachine::new().with_history_capacity(capacity);
        for trigger in triggers {
            let result = machine.transition(trigger);
            prop_assert!(machine.history().count() <= capacity);
            let last = machine.history().last().unwrap();
            prop_assert_eq!(last.accepted, result.accepted);
            prop_assert_eq!(last.to, result.to);
        }
    }
}
