//! Bounds-checked step index plus the set of completed steps.

use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepNavigator {
    current: usize,
    step_count: usize,
    completed: BTreeSet<usize>,
}

impl StepNavigator {
    pub fn new(step_count: usize) -> Self {
        Self {
            current: 0,
            step_count,
            completed: BTreeSet::new(),
        }
    }

    /// Rebuild from persisted values. Indices outside the recipe are dropped.
    pub fn restore(step_count: usize, current: usize, completed: &[usize]) -> Self {
        let current = if current < step_count { current } else { 0 };
        Self {
            current,
            step_count,
            completed: completed
                .iter()
                .copied()
                .filter(|i| *i < step_count)
                .collect(),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.step_count
    }

    /// Move to `index`. Out-of-range requests are ignored and return `false`.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.step_count {
            return false;
        }
        self.current = index;
        true
    }

    /// Index one after the current step, if there is one.
    pub fn next_index(&self) -> Option<usize> {
        let next = self.current + 1;
        (next < self.step_count).then_some(next)
    }

    /// Index one before the current step, if there is one.
    pub fn previous_index(&self) -> Option<usize> {
        self.current.checked_sub(1)
    }

    /// Mark a step done or not done. Returns whether anything changed.
    pub fn set_completed(&mut self, index: usize, completed: bool) -> bool {
        if index >= self.step_count {
            return false;
        }
        if completed {
            self.completed.insert(index)
        } else {
            self.completed.remove(&index)
        }
    }

    pub fn is_completed(&self, index: usize) -> bool {
        self.completed.contains(&index)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn completed_indices(&self) -> Vec<usize> {
        self.completed.iter().copied().collect()
    }
}
