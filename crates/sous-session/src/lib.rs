//! Sous Session crate - the guided-cooking session engine.
//!
//! Owns every piece of mutable session state: the step navigator, the
//! ingredient tracker, the timer bank, and the pause and completion flags.
//! `SessionManager` is the single writer; the tick loop and the voice
//! interpreter only reach state through its operations.

pub mod ingredients;
pub mod navigator;
pub mod session;
pub mod ticker;
pub mod timers;

pub use ingredients::IngredientTracker;
pub use navigator::StepNavigator;
pub use session::{
    lock_session, SessionManager, SessionView, SharedSession, StartOutcome, StepIngredient,
    TimerCompletion,
};
pub use ticker::{TickReport, Ticker};
pub use timers::{CompletionAlert, SilentAlert, TimerBank};
