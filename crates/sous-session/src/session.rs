//! Session state container.
//!
//! `SessionManager` aggregates the step navigator, ingredient tracker, and
//! timer bank with the recipe, pause flag, completion flag, and timestamps.
//! It is the only writer of session state and persists a snapshot through
//! the configured `SessionStore` after every change.
//!
//! Invalid requests (out-of-range steps, unknown timer ids, operations
//! without a session) are absorbed as no-ops. Nothing here returns an error.

use std::sync::{Arc, Mutex, MutexGuard};

use sous_core::error::{Result, SousError};
use sous_core::events::SessionEvent;
use sous_core::store::SessionStore;
use sous_core::types::{
    ingredient_id, Ingredient, NewTimer, Recipe, SessionSnapshot, TimerId, TimerState, Timestamp,
};

use crate::ingredients::IngredientTracker;
use crate::navigator::StepNavigator;
use crate::timers::{CompletionAlert, TimerBank};

/// Session container shared between the tick loop and the voice loop.
pub type SharedSession = Arc<Mutex<SessionManager>>;

/// Lock a shared session, mapping poisoning into `SousError::SessionLock`.
pub fn lock_session(session: &SharedSession) -> Result<MutexGuard<'_, SessionManager>> {
    session
        .lock()
        .map_err(|e| SousError::SessionLock(e.to_string()))
}

/// How `SessionManager::begin` handled the incoming recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A fresh session replaced whatever was there.
    Started,
    /// The active session already belonged to this recipe and was kept.
    Resumed,
}

/// A handled timer completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerCompletion {
    pub timer: TimerState,
    /// Position of the timer's step, if it still resolves.
    pub step_index: Option<usize>,
    /// Whether the view moved to the timer's step.
    pub navigated: bool,
}

/// An ingredient of the current step with its used flag.
#[derive(Debug, Clone, PartialEq)]
pub struct StepIngredient {
    pub ingredient: Ingredient,
    pub used: bool,
}

/// Read-only projection of the session for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub recipe_title: String,
    pub step_index: usize,
    pub step_count: usize,
    pub instruction: String,
    pub timer: Option<TimerState>,
    /// Set when the current step's own timer finished while it was on screen.
    pub timer_complete: bool,
    pub completed_steps: usize,
    /// Completed steps over total steps, in `[0.0, 1.0]`.
    pub progress: f32,
    pub is_paused: bool,
    pub is_completed: bool,
    pub step_ingredients: Vec<StepIngredient>,
}

#[derive(Debug, Clone)]
struct CookingSession {
    recipe: Recipe,
    raw_source: Option<String>,
    navigator: StepNavigator,
    ingredients: IngredientTracker,
    timers: TimerBank,
    is_completed: bool,
    is_paused: bool,
    started_at: Timestamp,
    last_active_at: Timestamp,
    step_timer_complete: bool,
}

impl CookingSession {
    fn new(recipe: Recipe, raw_source: Option<String>) -> Self {
        let now = Timestamp::now();
        Self {
            navigator: StepNavigator::new(recipe.step_count()),
            recipe,
            raw_source,
            ingredients: IngredientTracker::new(),
            timers: TimerBank::new(),
            is_completed: false,
            is_paused: false,
            started_at: now,
            last_active_at: now,
            step_timer_complete: false,
        }
    }

    fn from_snapshot(snapshot: SessionSnapshot) -> Option<Self> {
        let recipe = snapshot.recipe?;
        let now = Timestamp::now();
        Some(Self {
            navigator: StepNavigator::restore(
                recipe.step_count(),
                snapshot.current_step_index,
                &snapshot.completed_step_indices,
            ),
            recipe,
            raw_source: snapshot.raw_recipe_source,
            ingredients: IngredientTracker::from_ids(snapshot.used_ingredient_ids),
            timers: TimerBank::from_timers(snapshot.timers),
            is_completed: snapshot.is_completed,
            is_paused: snapshot.is_paused,
            started_at: snapshot.started_at.unwrap_or(now),
            last_active_at: snapshot.last_active_at.unwrap_or(now),
            step_timer_complete: false,
        })
    }

    fn to_snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            recipe: Some(self.recipe.clone()),
            raw_recipe_source: self.raw_source.clone(),
            current_step_index: self.navigator.current(),
            used_ingredient_ids: self.ingredients.used_ids(),
            completed_step_indices: self.navigator.completed_indices(),
            timers: self.timers.timers().to_vec(),
            is_completed: self.is_completed,
            started_at: Some(self.started_at),
            last_active_at: Some(self.last_active_at),
            is_paused: self.is_paused,
        }
    }

    fn touch(&mut self) {
        self.last_active_at = Timestamp::now();
    }

    fn current_step_id(&self) -> Option<&str> {
        self.recipe
            .step(self.navigator.current())
            .map(|s| s.id.as_str())
    }

    /// Create the current step's timer on first entry when it has a duration.
    fn enter_current_step(&mut self, events: &mut Vec<SessionEvent>) {
        let index = self.navigator.current();
        let Some(step) = self.recipe.step(index) else {
            return;
        };
        if step.estimated_minutes == 0 || self.timers.for_step(&step.id).is_some() {
            return;
        }
        let total_seconds = step.estimated_minutes.saturating_mul(60);
        let step_id = step.id.clone();
        let timer_id = self.timers.add(NewTimer {
            step_id: step_id.clone(),
            label: format!("Step {}", index + 1),
            total_seconds,
        });
        events.push(SessionEvent::TimerAdded {
            timer_id,
            step_id,
            total_seconds,
            timestamp: Timestamp::now(),
        });
    }

    /// Shared primitive behind every step change.
    fn move_to(&mut self, index: usize, events: &mut Vec<SessionEvent>) -> bool {
        let from = self.navigator.current();
        if !self.navigator.go_to(index) {
            tracing::debug!(index, step_count = self.navigator.step_count(), "Ignoring out-of-range step");
            return false;
        }
        self.touch();
        if from != index {
            self.step_timer_complete = false;
            tracing::debug!(from, to = index, "Step changed");
            events.push(SessionEvent::StepChanged {
                from,
                to: index,
                timestamp: Timestamp::now(),
            });
            self.enter_current_step(events);
        }
        true
    }
}

/// The session state container.
pub struct SessionManager {
    session: Option<CookingSession>,
    store: Option<Arc<dyn SessionStore>>,
    events: Vec<SessionEvent>,
    dirty: bool,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("session", &self.session)
            .field("has_store", &self.store.is_some())
            .field("pending_events", &self.events.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl SessionManager {
    /// An empty container without persistence.
    pub fn new() -> Self {
        Self {
            session: None,
            store: None,
            events: Vec::new(),
            dirty: false,
        }
    }

    /// An empty container that writes through `store`.
    pub fn with_store(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::new()
        }
    }

    /// Load the stored session, if any, and keep writing through `store`.
    ///
    /// A failed read is treated as "no session".
    pub fn restore(store: Arc<dyn SessionStore>) -> Self {
        let session = match store.load() {
            Ok(Some(snapshot)) => CookingSession::from_snapshot(snapshot),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored session, starting empty");
                None
            }
        };
        if let Some(ref s) = session {
            tracing::info!(
                title = %s.recipe.title,
                step = s.navigator.current(),
                timers = s.timers.timers().len(),
                "Restored cooking session"
            );
        }
        Self {
            session,
            store: Some(store),
            events: Vec::new(),
            dirty: false,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start a fresh session for `recipe`, replacing any existing one.
    pub fn start_cooking(&mut self, recipe: Recipe, raw_source: Option<String>) {
        tracing::info!(title = %recipe.title, steps = recipe.step_count(), "Cooking session started");
        self.events.push(SessionEvent::SessionStarted {
            recipe_title: recipe.title.clone(),
            step_count: recipe.step_count(),
            timestamp: Timestamp::now(),
        });
        let mut session = CookingSession::new(recipe, raw_source);
        session.enter_current_step(&mut self.events);
        self.session = Some(session);
        self.persist();
    }

    /// Resume the active session if it is for a recipe with the same title,
    /// otherwise start a new one.
    pub fn begin(&mut self, recipe: Recipe, raw_source: Option<String>) -> StartOutcome {
        let resumable = self
            .session
            .as_ref()
            .is_some_and(|s| !s.is_completed && s.recipe.title == recipe.title);

        if !resumable {
            self.start_cooking(recipe, raw_source);
            return StartOutcome::Started;
        }

        if let Some(session) = self.session.as_mut() {
            session.touch();
            tracing::info!(title = %session.recipe.title, step = session.navigator.current(), "Cooking session resumed");
            self.events.push(SessionEvent::SessionResumed {
                recipe_title: session.recipe.title.clone(),
                step_index: session.navigator.current(),
                timestamp: Timestamp::now(),
            });
        }
        self.persist();
        StartOutcome::Resumed
    }

    /// Mark the recipe finished. Terminal until reset or a new start.
    pub fn complete_recipe(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.is_completed {
            return;
        }
        session.is_completed = true;
        session.touch();
        tracing::info!(title = %session.recipe.title, "Recipe completed");
        self.events.push(SessionEvent::RecipeCompleted {
            recipe_title: session.recipe.title.clone(),
            timestamp: Timestamp::now(),
        });
        self.persist();
    }

    /// Return to the empty initial state and clear the stored record.
    pub fn reset_session(&mut self) {
        if self.session.take().is_some() {
            tracing::info!("Cooking session reset");
        }
        self.events.push(SessionEvent::SessionReset {
            timestamp: Timestamp::now(),
        });
        self.persist();
    }

    /// Flip the global kitchen break. Returns the new value.
    pub fn toggle_pause(&mut self) -> Option<bool> {
        let session = self.session.as_mut()?;
        session.is_paused = !session.is_paused;
        session.touch();
        let paused = session.is_paused;
        tracing::info!(paused, "Kitchen break toggled");
        self.events.push(SessionEvent::PauseToggled {
            paused,
            timestamp: Timestamp::now(),
        });
        self.persist();
        Some(paused)
    }

    pub fn has_active_session(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_completed)
    }

    // =========================================================================
    // Steps
    // =========================================================================

    /// Move to `index`. Out-of-range indices are ignored.
    pub fn go_to_step(&mut self, index: usize) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.move_to(index, &mut self.events) {
            return false;
        }
        self.persist();
        true
    }

    pub fn go_to_next_step(&mut self) -> bool {
        match self.session.as_ref().and_then(|s| s.navigator.next_index()) {
            Some(index) => self.go_to_step(index),
            None => false,
        }
    }

    pub fn go_to_previous_step(&mut self) -> bool {
        match self
            .session
            .as_ref()
            .and_then(|s| s.navigator.previous_index())
        {
            Some(index) => self.go_to_step(index),
            None => false,
        }
    }

    /// Mark a step done or not done. Returns whether anything changed.
    pub fn set_step_completed(&mut self, index: usize, completed: bool) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.navigator.set_completed(index, completed) {
            return false;
        }
        session.touch();
        self.events.push(SessionEvent::StepCompletionChanged {
            step_index: index,
            completed,
            timestamp: Timestamp::now(),
        });
        self.persist();
        true
    }

    // =========================================================================
    // Ingredients
    // =========================================================================

    /// Flip an ingredient's used flag. Returns the new value.
    pub fn toggle_ingredient(&mut self, ingredient_id: &str) -> Option<bool> {
        let session = self.session.as_mut()?;
        let used = session.ingredients.toggle(ingredient_id);
        session.touch();
        self.events.push(SessionEvent::IngredientToggled {
            ingredient_id: ingredient_id.to_string(),
            used,
            timestamp: Timestamp::now(),
        });
        self.persist();
        Some(used)
    }

    /// Toggle by name and quantity, deriving the id the way recipes do.
    pub fn toggle_ingredient_named(&mut self, name: &str, quantity: &str) -> Option<bool> {
        self.toggle_ingredient(&ingredient_id(name, quantity))
    }

    pub fn is_ingredient_used(&self, ingredient_id: &str) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.ingredients.is_used(ingredient_id))
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Create a timer, or return the one already attached to the same step.
    pub fn add_timer(&mut self, new: NewTimer) -> Option<TimerId> {
        let session = self.session.as_mut()?;
        if let Some(existing) = session.timers.for_step(&new.step_id) {
            return Some(existing.id);
        }
        let step_id = new.step_id.clone();
        let total_seconds = new.total_seconds;
        let timer_id = session.timers.add(new);
        session.touch();
        self.events.push(SessionEvent::TimerAdded {
            timer_id,
            step_id,
            total_seconds,
            timestamp: Timestamp::now(),
        });
        self.persist();
        Some(timer_id)
    }

    pub fn start_timer(&mut self, id: TimerId) -> bool {
        self.update_timers(|bank| bank.start(id))
    }

    pub fn pause_timer(&mut self, id: TimerId) -> bool {
        self.update_timers(|bank| bank.pause(id))
    }

    pub fn reset_timer(&mut self, id: TimerId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let on_current_step = match (session.timers.get(id), session.current_step_id()) {
            (Some(timer), Some(step_id)) => timer.step_id == step_id,
            _ => false,
        };
        if !session.timers.reset(id) {
            return false;
        }
        if on_current_step {
            session.step_timer_complete = false;
        }
        session.touch();
        self.persist();
        true
    }

    pub fn adjust_timer(&mut self, id: TimerId, delta_seconds: i64) -> bool {
        self.update_timers(|bank| bank.adjust(id, delta_seconds))
    }

    pub fn remove_timer(&mut self, id: TimerId) -> bool {
        self.update_timers(|bank| bank.remove(id))
    }

    /// Remove one second from a single timer. Does not touch `last_active_at`.
    pub fn tick_timer(&mut self, id: TimerId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let ticked = session.timers.tick(id);
        self.dirty |= ticked;
        ticked
    }

    fn update_timers(&mut self, f: impl FnOnce(&mut TimerBank) -> bool) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !f(&mut session.timers) {
            return false;
        }
        session.touch();
        self.persist();
        true
    }

    /// One pass of the global tick loop.
    ///
    /// Advances every running timer by one second unless the kitchen break
    /// is on. Individual `is_running` flags are never touched by the break.
    pub fn tick(&mut self) -> usize {
        let Some(session) = self.session.as_mut() else {
            return 0;
        };
        if session.is_paused {
            return 0;
        }
        let advanced = session.timers.tick_running();
        if advanced > 0 {
            self.dirty = true;
        }
        advanced
    }

    /// Handle timers that reached zero since the last call.
    ///
    /// For each newly complete timer: fire the alert, then surface its step
    /// if the cook is looking elsewhere, or flag the current step otherwise.
    pub fn process_completions(&mut self, alert: &dyn CompletionAlert) -> Vec<TimerCompletion> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let completed = session.timers.take_completions();
        if completed.is_empty() {
            return Vec::new();
        }

        let mut handled = Vec::with_capacity(completed.len());
        for timer in completed {
            alert.timer_completed(&timer);

            let step_index = session.recipe.step_index(&timer.step_id);
            let navigated = match step_index {
                Some(index) if index != session.navigator.current() => {
                    session.move_to(index, &mut self.events)
                }
                Some(_) => {
                    session.step_timer_complete = true;
                    false
                }
                None => false,
            };

            tracing::info!(timer_id = %timer.id, step_id = %timer.step_id, navigated, "Timer completed");
            self.events.push(SessionEvent::TimerCompleted {
                timer_id: timer.id,
                step_id: timer.step_id.clone(),
                navigated,
                timestamp: Timestamp::now(),
            });
            handled.push(TimerCompletion {
                timer,
                step_index,
                navigated,
            });
        }

        self.persist();
        handled
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn recipe(&self) -> Option<&Recipe> {
        self.session.as_ref().map(|s| &s.recipe)
    }

    pub fn raw_recipe_source(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.raw_source.as_deref())
    }

    pub fn step_count(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |s| s.navigator.step_count())
    }

    pub fn current_step_index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.navigator.current())
    }

    pub fn current_instruction(&self) -> Option<&str> {
        let session = self.session.as_ref()?;
        session
            .recipe
            .step(session.navigator.current())
            .map(|s| s.text.as_str())
    }

    pub fn is_paused(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_paused)
    }

    pub fn is_completed(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_completed)
    }

    pub fn is_last_step(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.navigator.is_last())
    }

    pub fn timers(&self) -> &[TimerState] {
        self.session.as_ref().map_or(&[], |s| s.timers.timers())
    }

    pub fn timer(&self, id: TimerId) -> Option<&TimerState> {
        self.session.as_ref().and_then(|s| s.timers.get(id))
    }

    pub fn timer_for_step(&self, step_id: &str) -> Option<&TimerState> {
        self.session.as_ref().and_then(|s| s.timers.for_step(step_id))
    }

    pub fn current_step_timer(&self) -> Option<&TimerState> {
        let session = self.session.as_ref()?;
        session.timers.for_step(session.current_step_id()?)
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.session.as_ref().map(|s| s.started_at)
    }

    pub fn last_active_at(&self) -> Option<Timestamp> {
        self.session.as_ref().map(|s| s.last_active_at)
    }

    /// The persisted shape of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session
            .as_ref()
            .map(CookingSession::to_snapshot)
            .unwrap_or_default()
    }

    pub fn view(&self) -> Option<SessionView> {
        let session = self.session.as_ref()?;
        let index = session.navigator.current();
        let step_count = session.navigator.step_count();
        let completed_steps = session.navigator.completed_count();
        let progress = if step_count == 0 {
            0.0
        } else {
            completed_steps as f32 / step_count as f32
        };
        let step_ingredients = session
            .recipe
            .ingredients_for_step(index)
            .into_iter()
            .map(|i| StepIngredient {
                used: session.ingredients.is_used(&i.id),
                ingredient: i.clone(),
            })
            .collect();

        Some(SessionView {
            recipe_title: session.recipe.title.clone(),
            step_index: index,
            step_count,
            instruction: session
                .recipe
                .step(index)
                .map(|s| s.text.clone())
                .unwrap_or_default(),
            timer: self.current_step_timer().cloned(),
            timer_complete: session.step_timer_complete,
            completed_steps,
            progress,
            is_paused: session.is_paused,
            is_completed: session.is_completed,
            step_ingredients,
        })
    }

    /// Take the events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Write the snapshot if ticks changed anything since the last write.
    pub fn flush(&mut self) {
        if self.dirty {
            self.persist();
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn persist(&mut self) {
        self.dirty = false;
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let result = match self.session.as_ref() {
            Some(session) => store.save(&session.to_snapshot()),
            None => store.clear(),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to persist cooking session");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
