//! Apply a matched voice command to the session.
//!
//! Commands only reach state through `SessionManager` operations. Commands
//! that make no sense in the current state (no timer on this step, already
//! on the first step) are absorbed and reported as not applied.

use sous_core::types::NewTimer;
use sous_session::SessionManager;

use crate::commands::VoiceCommand;

/// What a dispatched command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub command: VoiceCommand,
    pub applied: bool,
    /// Text to read aloud in response, if any.
    pub speech: Option<String>,
}

impl DispatchOutcome {
    fn applied(command: VoiceCommand, applied: bool) -> Self {
        Self {
            command,
            applied,
            speech: None,
        }
    }
}

/// Apply `command` to `session`. `add_seconds` is the time added by
/// `VoiceCommand::AddMinute`.
pub fn dispatch(session: &mut SessionManager, command: VoiceCommand, add_seconds: i64) -> DispatchOutcome {
    if !session.has_active_session() {
        tracing::debug!(%command, "Ignoring voice command without an active session");
        return DispatchOutcome::applied(command, false);
    }

    let applied = match command {
        VoiceCommand::GoToStep(index) => session.go_to_step(index),
        VoiceCommand::NextStep => advance(session),
        VoiceCommand::PreviousStep => session.go_to_previous_step(),
        VoiceCommand::PauseTimer => with_current_timer(session, SessionManager::pause_timer),
        VoiceCommand::StartTimer => with_current_timer(session, SessionManager::start_timer),
        VoiceCommand::ResetTimer => with_current_timer(session, SessionManager::reset_timer),
        VoiceCommand::ToggleBreak => session.toggle_pause().is_some(),
        VoiceCommand::Resume => {
            if session.is_paused() {
                session.toggle_pause().is_some()
            } else {
                with_current_timer(session, SessionManager::start_timer)
            }
        }
        VoiceCommand::Repeat => {
            return DispatchOutcome {
                command,
                applied: true,
                speech: session.current_instruction().map(str::to_string),
            };
        }
        VoiceCommand::AddMinute => add_time(session, add_seconds),
        VoiceCommand::CompleteRecipe => {
            session.complete_recipe();
            true
        }
    };

    tracing::info!(%command, applied, "Voice command dispatched");
    DispatchOutcome::applied(command, applied)
}

/// Mark the current step done and move on. On the last step this finishes
/// the recipe.
fn advance(session: &mut SessionManager) -> bool {
    let Some(current) = session.current_step_index() else {
        return false;
    };
    session.set_step_completed(current, true);
    if session.is_last_step() {
        session.complete_recipe();
        true
    } else {
        session.go_to_next_step()
    }
}

fn with_current_timer(
    session: &mut SessionManager,
    op: fn(&mut SessionManager, sous_core::types::TimerId) -> bool,
) -> bool {
    match session.current_step_timer().map(|t| t.id) {
        Some(id) => op(session, id),
        None => false,
    }
}

/// Extend the current step's timer, or give the step a fresh running timer
/// when it has none or the old one already finished.
fn add_time(session: &mut SessionManager, seconds: i64) -> bool {
    let current = session
        .current_step_timer()
        .map(|t| (t.id, t.is_complete));

    match current {
        Some((id, false)) => session.adjust_timer(id, seconds),
        Some((id, true)) => {
            session.remove_timer(id);
            start_fresh_timer(session, seconds)
        }
        None => start_fresh_timer(session, seconds),
    }
}

fn start_fresh_timer(session: &mut SessionManager, seconds: i64) -> bool {
    let (Some(index), Ok(total_seconds)) = (session.current_step_index(), u32::try_from(seconds))
    else {
        return false;
    };
    let Some(step_id) = session
        .recipe()
        .and_then(|r| r.step(index))
        .map(|s| s.id.clone())
    else {
        return false;
    };
    let Some(id) = session.add_timer(NewTimer {
        step_id,
        label: format!("Step {}", index + 1),
        total_seconds,
    }) else {
        return false;
    };
    session.start_timer(id)
}
