use serde::{Deserialize, Serialize};

use crate::types::{TimerId, Timestamp};

/// Everything that can happen to a cooking session.
///
/// Events are recorded by the session container after each state change
/// and drained by the composition root, which uses them to drive narration
/// and logging. They are not persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SessionEvent {
    /// A new session began for the given recipe.
    SessionStarted {
        recipe_title: String,
        step_count: usize,
        timestamp: Timestamp,
    },

    /// An existing session for the same recipe was picked up again.
    SessionResumed {
        recipe_title: String,
        step_index: usize,
        timestamp: Timestamp,
    },

    /// The current step changed.
    StepChanged {
        from: usize,
        to: usize,
        timestamp: Timestamp,
    },

    /// A timer was created for a step.
    TimerAdded {
        timer_id: TimerId,
        step_id: String,
        total_seconds: u32,
        timestamp: Timestamp,
    },

    /// A timer counted down to zero and its completion was handled.
    TimerCompleted {
        timer_id: TimerId,
        step_id: String,
        /// Whether the view was moved to the timer's step.
        navigated: bool,
        timestamp: Timestamp,
    },

    /// The global kitchen break was switched on or off.
    PauseToggled { paused: bool, timestamp: Timestamp },

    /// An ingredient was marked used or unused.
    IngredientToggled {
        ingredient_id: String,
        used: bool,
        timestamp: Timestamp,
    },

    /// A step was marked done or not done.
    StepCompletionChanged {
        step_index: usize,
        completed: bool,
        timestamp: Timestamp,
    },

    /// The recipe was finished.
    RecipeCompleted {
        recipe_title: String,
        timestamp: Timestamp,
    },

    /// The session was cleared.
    SessionReset { timestamp: Timestamp },
}

impl SessionEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            SessionEvent::SessionStarted { timestamp, .. }
            | SessionEvent::SessionResumed { timestamp, .. }
            | SessionEvent::StepChanged { timestamp, .. }
            | SessionEvent::TimerAdded { timestamp, .. }
            | SessionEvent::TimerCompleted { timestamp, .. }
            | SessionEvent::PauseToggled { timestamp, .. }
            | SessionEvent::IngredientToggled { timestamp, .. }
            | SessionEvent::StepCompletionChanged { timestamp, .. }
            | SessionEvent::RecipeCompleted { timestamp, .. }
            | SessionEvent::SessionReset { timestamp } => *timestamp,
        }
    }

    /// Returns a stable event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            SessionEvent::SessionStarted { .. } => "session_started",
            SessionEvent::SessionResumed { .. } => "session_resumed",
            SessionEvent::StepChanged { .. } => "step_changed",
            SessionEvent::TimerAdded { .. } => "timer_added",
            SessionEvent::TimerCompleted { .. } => "timer_completed",
            SessionEvent::PauseToggled { .. } => "pause_toggled",
            SessionEvent::IngredientToggled { .. } => "ingredient_toggled",
            SessionEvent::StepCompletionChanged { .. } => "step_completion_changed",
            SessionEvent::RecipeCompleted { .. } => "recipe_completed",
            SessionEvent::SessionReset { .. } => "session_reset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name_and_timestamp() {
        let ts = Timestamp(1_700_000_000);
        let event = SessionEvent::StepChanged {
            from: 0,
            to: 2,
            timestamp: ts,
        };
        assert_eq!(event.event_name(), "step_changed");
        assert_eq!(event.timestamp(), ts);

        let event = SessionEvent::SessionReset { timestamp: ts };
        assert_eq!(event.event_name(), "session_reset");
        assert_eq!(event.timestamp(), ts);
    }

    #[test]
    fn test_event_serializes() {
        let event = SessionEvent::PauseToggled {
            paused: true,
            timestamp: Timestamp(42),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("PauseToggled"));
        let back: SessionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
