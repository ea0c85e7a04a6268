use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::Utc;
use tracing::{debug, warn};

use crate::types::{next_state, KernelState, KernelTrigger, StateChange, TransitionRecord, TransitionResult};

/// Entries into `error` that force safe mode.
pub const MAX_CONSECUTIVE_ERRORS: u32 = 3;
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// Handle returned by [`KernelStateMachine::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn(&StateChange) + Send>;

/// Lifecycle state machine for one action.
pub struct KernelStateMachine {
    state: KernelState,
    consecutive_errors: u32,
    max_consecutive_errors: u32,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    history: VecDeque<TransitionRecord>,
    history_capacity: usize,
}

impl KernelStateMachine {
    pub fn new() -> Self {
        Self {
            state: KernelState::Idle,
            consecutive_errors: 0,
            max_consecutive_errors: MAX_CONSECUTIVE_ERRORS,
            listeners: Vec::new(),
            next_listener: 0,
            history: VecDeque::new(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }

    pub fn state(&self) -> KernelState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == KernelState::Idle
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    /// Triggers the current state accepts.
    pub fn allowed_triggers(&self) -> Vec<KernelTrigger> {
        KernelTrigger::ALL
            .into_iter()
            .filter(|t| next_state(self.state, *t).is_some())
            .collect()
    }

    pub fn can_accept(&self, trigger: KernelTrigger) -> bool {
        next_state(self.state, trigger).is_some()
    }

    /// Accepted and rejected transitions, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.history.iter()
    }

    /// Register a listener for accepted transitions.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&StateChange) + Send + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Apply a trigger. Never panics; invalid triggers are rejected and
    /// leave the state unchanged.
    pub fn transition(&mut self, trigger: KernelTrigger) -> TransitionResult {
        let from = self.state;

        let Some(to) = next_state(from, trigger) else {
            let reason = format!("trigger '{trigger}' is not valid in state '{from}'");
            debug!(%from, %trigger, "Kernel transition rejected");
            self.record(from, from, trigger, false, Some(reason.clone()));
            return TransitionResult {
                accepted: false,
                from,
                to: from,
                trigger,
                reason: Some(reason),
                escalated: false,
            };
        };

        self.apply(from, to, trigger);

        let mut escalated = false;
        if to == KernelState::Error && self.consecutive_errors >= self.max_consecutive_errors {
            warn!(
                consecutive_errors = self.consecutive_errors,
                "Consecutive error limit reached, escalating to safe mode"
            );
            self.apply(KernelState::Error, KernelState::SafeMode, KernelTrigger::EscalateSafeMode);
            escalated = true;
        }

        TransitionResult {
            accepted: true,
            from,
            to: self.state,
            trigger,
            reason: None,
            escalated,
        }
    }

    fn apply(&mut self, from: KernelState, to: KernelState, trigger: KernelTrigger) {
        self.state = to;
        match (to, trigger) {
            (KernelState::Error, _) => self.consecutive_errors += 1,
            (_, KernelTrigger::VerificationPassed | KernelTrigger::SafeModeExit) => {
                self.consecutive_errors = 0
            }
            _ => {}
        }
        debug!(%from, %to, %trigger, "Kernel transition");
        self.record(from, to, trigger, true, None);
        self.notify(StateChange { from, to, trigger });
    }

    fn notify(&self, change: StateChange) {
        for (id, listener) in &self.listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(&change))).is_err() {
                warn!(listener = id.0, trigger = %change.trigger, "State listener panicked");
            }
        }
    }

    fn record(
        &mut self,
        from: KernelState,
        to: KernelState,
        trigger: KernelTrigger,
        accepted: bool,
        reason: Option<String>,
    ) {
        if self.history.len() == self.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(TransitionRecord {
            from,
            to,
            trigger,
            accepted,
            reason,
            at: Utc::now(),
        });
    }
}

impl Default for KernelStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KernelStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelStateMachine")
            .field("state", &self.state)
            .field("consecutive_errors", &self.consecutive_errors)
            .field("listeners", &self.listeners.len())
            .field("history", &self.history.len())
            .finish()
    }
}
