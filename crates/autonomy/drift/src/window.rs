use std::collections::VecDeque;

/// Hard cap on retained outputs per session.
pub const MAX_WINDOW: usize = 50;

/// Bounded ring buffer of agent-authored outputs, oldest first.
#[derive(Clone, Debug)]
pub struct OutputWindow {
    capacity: usize,
    outputs: VecDeque<String>,
}

impl OutputWindow {
    /// `capacity` is clamped to `1..=MAX_WINDOW`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_WINDOW);
        Self {
            capacity,
            outputs: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, output: impl Into<String>) {
        if self.outputs.len() == self.capacity {
            self.outputs.pop_front();
        }
        self.outputs.push_back(output.into());
    }

    /// Up to `n` most recent outputs, oldest first.
    pub fn recent(&self, n: usize) -> Vec<String> {
        let skip = self.outputs.len().saturating_sub(n);
        self.outputs.iter().skip(skip).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.outputs.iter()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.outputs.clear();
    }
}

impl Default for OutputWindow {
    fn default() -> Self {
        Self::new(MAX_WINDOW)
    }
}
