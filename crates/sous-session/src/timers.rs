//! Timer bank: the collection of step countdowns for one session.
//!
//! Timers are keyed by id and looked up by step before creation, so a step
//! never owns more than one timer. Any number may run at once; the tick loop
//! advances all of them regardless of which step is on screen.
//!
//! Completion handling is tracked here too. A timer that reaches zero is
//! reported by `take_completions` exactly once; resetting it clears the
//! marker so it can complete again.

use std::collections::HashSet;

use sous_core::types::{NewTimer, TimerId, TimerState};

/// Receives timer completions (sound, haptics, notifications).
pub trait CompletionAlert: Send + Sync {
    fn timer_completed(&self, timer: &TimerState);
}

/// Alert sink that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAlert;

impl CompletionAlert for SilentAlert {
    fn timer_completed(&self, _timer: &TimerState) {}
}

#[derive(Debug, Default, Clone)]
pub struct TimerBank {
    timers: Vec<TimerState>,
    handled_completions: HashSet<TimerId>,
}

impl TimerBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a bank from persisted timers.
    ///
    /// Timers that were already complete when the snapshot was written count
    /// as handled, so restoring a session does not replay their alerts.
    pub fn from_timers(timers: Vec<TimerState>) -> Self {
        let handled_completions = timers
            .iter()
            .filter(|t| t.is_complete)
            .map(|t| t.id)
            .collect();
        Self {
            timers,
            handled_completions,
        }
    }

    pub fn timers(&self) -> &[TimerState] {
        &self.timers
    }

    pub fn get(&self, id: TimerId) -> Option<&TimerState> {
        self.timers.iter().find(|t| t.id == id)
    }

    pub fn for_step(&self, step_id: &str) -> Option<&TimerState> {
        self.timers.iter().find(|t| t.step_id == step_id)
    }

    pub fn running_count(&self) -> usize {
        self.timers.iter().filter(|t| t.is_ticking()).count()
    }

    fn get_mut(&mut self, id: TimerId) -> Option<&mut TimerState> {
        self.timers.iter_mut().find(|t| t.id == id)
    }

    /// Create a timer, or return the existing one for the same step.
    pub fn add(&mut self, new: NewTimer) -> TimerId {
        if let Some(existing) = self.for_step(&new.step_id) {
            tracing::debug!(timer_id = %existing.id, step_id = %new.step_id, "Reusing step timer");
            return existing.id;
        }

        let timer = TimerState {
            id: TimerId::generate(),
            step_id: new.step_id,
            label: new.label,
            total_seconds: new.total_seconds,
            remaining_seconds: new.total_seconds,
            is_running: false,
            is_complete: false,
        };
        let id = timer.id;
        tracing::debug!(timer_id = %id, step_id = %timer.step_id, total = timer.total_seconds, "Timer added");
        self.timers.push(timer);
        id
    }

    /// Start counting down. Returns `false` for unknown, running, or complete timers.
    pub fn start(&mut self, id: TimerId) -> bool {
        match self.get_mut(id) {
            Some(timer) if !timer.is_complete && !timer.is_running => {
                timer.is_running = true;
                true
            }
            _ => false,
        }
    }

    pub fn pause(&mut self, id: TimerId) -> bool {
        match self.get_mut(id) {
            Some(timer) if timer.is_running => {
                timer.is_running = false;
                true
            }
            _ => false,
        }
    }

    /// Restore the full duration and stop the timer.
    pub fn reset(&mut self, id: TimerId) -> bool {
        let Some(timer) = self.get_mut(id) else {
            return false;
        };
        timer.remaining_seconds = timer.total_seconds;
        timer.is_running = false;
        timer.is_complete = false;
        self.handled_completions.remove(&id);
        true
    }

    /// Remove one second. Completes the timer when it reaches zero.
    ///
    /// A complete timer is left untouched.
    pub fn tick(&mut self, id: TimerId) -> bool {
        match self.get_mut(id) {
            Some(timer) if !timer.is_complete => {
                timer.remaining_seconds = timer.remaining_seconds.saturating_sub(1);
                if timer.remaining_seconds == 0 {
                    timer.is_complete = true;
                    timer.is_running = false;
                    tracing::debug!(timer_id = %id, "Timer reached zero");
                }
                true
            }
            _ => false,
        }
    }

    /// Add `delta_seconds` to both remaining and total time, clamped at zero.
    ///
    /// Landing on zero completes the timer. A complete timer is left
    /// untouched; it has to be reset first.
    pub fn adjust(&mut self, id: TimerId, delta_seconds: i64) -> bool {
        match self.get_mut(id) {
            Some(timer) if !timer.is_complete => {
                timer.remaining_seconds = clamp_seconds(timer.remaining_seconds, delta_seconds);
                timer.total_seconds = clamp_seconds(timer.total_seconds, delta_seconds);
                if timer.remaining_seconds == 0 {
                    timer.is_complete = true;
                    timer.is_running = false;
                }
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.handled_completions.remove(&id);
        self.timers.len() != before
    }

    /// Advance every running timer by one second. Returns how many moved.
    pub fn tick_running(&mut self) -> usize {
        let ids: Vec<TimerId> = self
            .timers
            .iter()
            .filter(|t| t.is_ticking())
            .map(|t| t.id)
            .collect();
        for id in &ids {
            self.tick(*id);
        }
        ids.len()
    }

    /// Complete timers whose completion has not been handled yet.
    ///
    /// Each completion is returned once; the id stays marked until the timer
    /// is reset or removed.
    pub fn take_completions(&mut self) -> Vec<TimerState> {
        let mut completed = Vec::new();
        for timer in &self.timers {
            if timer.is_complete && self.handled_completions.insert(timer.id) {
                completed.push(timer.clone());
            }
        }
        completed
    }
}

fn clamp_seconds(value: u32, delta: i64) -> u32 {
    (i64::from(value) + delta).clamp(0, i64::from(u32::MAX)) as u32
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn new_timer(step: &str, secs: u32) -> NewTimer {
        NewTimer {
            step_id: step.to_string(),
            label: format!("{} timer", step),
            total_seconds: secs,
        }
    }

    fn assert_invariants(timer: &TimerState) {
        assert!(timer.remaining_seconds <= timer.total_seconds);
        if timer.is_complete {
            assert!(!timer.is_running);
            assert_eq!(timer.remaining_seconds, 0);
        }
    }

    // ---- creation ----

    #[test]
    fn test_add_creates_stopped_timer() {
        let mut bank = TimerBank::new();
        let id = bank.add(new_timer("step-0", 90));
        let timer = bank.get(id).unwrap();
        assert_eq!(timer.remaining_seconds, 90);
        assert_eq!(timer.total_seconds, 90);
        assert!(!timer.is_running);
        assert!(!timer.is_complete);
    }

    #[test]
    fn test_add_reuses_timer_for_same_step() {
        let mut bank = TimerBank::new();
        let first = bank.add(new_timer("step-0", 90));
        bank.start(first);
        bank.tick(first);

        let second = bank.add(new_timer("step-0", 300));
        assert_eq!(first, second);
        assert_eq!(bank.timers().len(), 1);
        assert_eq!(bank.get(first).unwrap().remaining_seconds, 89);
    }

    // ---- start / pause ----

    #[test]
    fn test_start_and_pause() {
        let mut bank = TimerBank::new();
        let id = bank.add(new_timer("step-0", 10));
        assert!(bank.start(id));
        assert!(!bank.start(id));
        assert!(bank.get(id).unwrap().is_running);

        assert!(bank.pause(id));
        assert!(!bank.pause(id));
        assert!(!bank.get(id).unwrap().is_running);
    }

    #[test]
    fn test_start_complete_timer_is_noop() {
        let mut bank = TimerBank::new();
        let id = bank.add(new_timer("step-0", 1));
        bank.start(id);
        bank.tick(id);
        assert!(bank.get(id).unwrap().is_complete);
        assert!(!bank.start(id));
        assert!(!bank.get(id).unwrap().is_running);
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let mut bank = TimerBank::new();
        let ghost = TimerId::generate();
        assert!(!bank.start(ghost));
        assert!(!bank.pause(ghost));
        assert!(!bank.reset(ghost));
        assert!(!bank.tick(ghost));
        assert!(!bank.adjust(ghost, 60));
        assert!(!bank.remove(ghost));
    }

    // ---- tick ----

    #[test]
    fn test_tick_to_completion() {
        let mut bank = TimerBank::new();
        let id = bank.add(new_timer("step-0", 3));
        bank.start(id);
        for _ in 0..3 {
            assert!(bank.tick(id));
            assert_invariants(bank.get(id).unwrap());
        }
        let timer = bank.get(id).unwrap();
        assert_eq!(timer.remaining_seconds, 0);
        assert!(timer.is_complete);
        assert!(!timer.is_running);

        // Ticking a complete timer changes nothing.
        let before = timer.clone();
        assert!(!bank.tick(id));
        assert_eq!(bank.get(id).unwrap(), &before);
    }

    #[test]
    fn test_tick_running_advances_every_running_timer() {
        let mut bank = TimerBank::new();
        let a = bank.add(new_timer("step-0", 30));
        let b = bank.add(new_timer("step-2", 60));
        let idle = bank.add(new_timer("step-3", 60));
        bank.start(a);
        bank.start(b);

        assert_eq!(bank.tick_running(), 2);
        assert_eq!(bank.get(a).unwrap().remaining_seconds, 29);
        assert_eq!(bank.get(b).unwrap().remaining_seconds, 59);
        assert_eq!(bank.get(idle).unwrap().remaining_seconds, 60);
    }

    // ---- reset ----

    #[test]
    fn test_reset_restores_full_duration() {
        let mut bank = TimerBank::new();
        let id = bank.add(new_timer("step-0", 2));
        bank.start(id);
        bank.tick(id);
        bank.tick(id);
        assert!(bank.get(id).unwrap().is_complete);

        assert!(bank.reset(id));
        let timer = bank.get(id).unwrap();
        assert_eq!(timer.remaining_seconds, 2);
        assert!(!timer.is_complete);
        assert!(!timer.is_running);
        assert_invariants(timer);
    }

    // ---- adjust ----

    #[test]
    fn test_adjust_adds_to_both_values() {
        let mut bank = TimerBank::new();
        let id = bank.add(new_timer("step-0", 120));
        bank.start(id);
        for _ in 0..20 {
            bank.tick(id);
        }
        assert!(bank.adjust(id, 60));
        let timer = bank.get(id).unwrap();
        assert_eq!(timer.remaining_seconds, 160);
        assert_eq!(timer.total_seconds, 180);
        assert!(timer.is_running);
        assert_invariants(timer);
    }

    #[test]
    fn test_adjust_large_negative_clamps_and_completes() {
        let mut bank = TimerBank::new();
        let id = bank.add(new_timer("step-0", 30));
        bank.start(id);
        assert!(bank.adjust(id, -9999));
        let timer = bank.get(id).unwrap();
        assert_eq!(timer.remaining_seconds, 0);
        assert_eq!(timer.total_seconds, 0);
        assert!(timer.is_complete);
        assert!(!timer.is_running);
    }

    #[test]
    fn test_adjust_negative_keeps_remaining_within_total() {
        let mut bank = TimerBank::new();
        let id = bank.add(new_timer("step-0", 60));
        bank.start(id);
        for _ in 0..30 {
            bank.tick(id);
        }
        // remaining 30, total 60
        bank.adjust(id, -45);
        let timer = bank.get(id).unwrap();
        assert_eq!(timer.total_seconds, 15);
        assert_eq!(timer.remaining_seconds, 0);
        assert!(timer.is_complete);
        assert_invariants(timer);
    }

    #[test]
    fn test_adjust_complete_timer_is_noop() {
        let mut bank = TimerBank::new();
        let id = bank.add(new_timer("step-0", 1));
        bank.start(id);
        bank.tick(id);
        assert!(!bank.adjust(id, 60));
        assert_eq!(bank.get(id).unwrap().remaining_seconds, 0);
    }

    // ---- completions ----

    #[test]
    fn test_completion_reported_once() {
        let mut bank = TimerBank::new();
        let id = bank.add(new_timer("step-0", 1));
        bank.start(id);
        bank.tick(id);

        let first = bank.take_completions();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, id);
        assert!(bank.take_completions().is_empty());
    }

    #[test]
    fn test_reset_allows_second_completion() {
        let mut bank = TimerBank::new();
        let id = bank.add(new_timer("step-0", 1));
        bank.start(id);
        bank.tick(id);
        assert_eq!(bank.take_completions().len(), 1);

        bank.reset(id);
        bank.start(id);
        bank.tick(id);
        assert_eq!(bank.take_completions().len(), 1);
    }

    #[test]
    fn test_from_timers_marks_complete_as_handled() {
        let mut bank = TimerBank::new();
        let done = bank.add(new_timer("step-0", 1));
        let pending = bank.add(new_timer("step-1", 5));
        bank.start(done);
        bank.tick(done);

        let mut restored = TimerBank::from_timers(bank.timers().to_vec());
        assert!(restored.take_completions().is_empty());
        assert!(restored.get(pending).is_some());
    }

    #[test]
    fn test_remove() {
        let mut bank = TimerBank::new();
        let id = bank.add(new_timer("step-0", 10));
        assert!(bank.remove(id));
        assert!(bank.get(id).is_none());
        assert!(bank.for_step("step-0").is_none());
    }
}
