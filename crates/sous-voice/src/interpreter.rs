//! Transcript interpretation with command cooldown.
//!
//! The recognizer refines its guess several times per utterance, so every
//! spoken phrase shows up as a burst of partial transcripts followed by a
//! final one. After a match, all input is ignored for the cooldown window
//! so the burst fires its command once.

use std::time::{Duration, Instant};

use crate::commands::{CommandTable, VoiceCommand};
use crate::step_number::StepNumberParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptKind {
    Partial,
    Final,
}

pub struct VoiceInterpreter {
    table: CommandTable,
    steps: StepNumberParser,
    cooldown: Duration,
    last_match: Option<Instant>,
    partial: Option<String>,
}

impl VoiceInterpreter {
    pub fn new(cooldown: Duration) -> Self {
        Self::with_table(CommandTable::new(), cooldown)
    }

    pub fn with_table(table: CommandTable, cooldown: Duration) -> Self {
        Self {
            table,
            steps: StepNumberParser::new(),
            cooldown,
            last_match: None,
            partial: None,
        }
    }

    /// Map a transcript to a command.
    ///
    /// Step-number requests are tried before the phrase table; a number
    /// outside the recipe falls through to the table. Returns `None` for
    /// unmatched input and for anything arriving inside the cooldown.
    pub fn interpret(
        &mut self,
        transcript: &str,
        kind: TranscriptKind,
        step_count: usize,
        now: Instant,
    ) -> Option<VoiceCommand> {
        if self.is_cooling_down(now) {
            return None;
        }

        let normalized = transcript.trim().to_lowercase();
        match kind {
            TranscriptKind::Partial => self.partial = Some(normalized.clone()),
            TranscriptKind::Final => self.partial = None,
        }

        let command = self
            .steps
            .resolve(&normalized, step_count)
            .map(VoiceCommand::GoToStep)
            .or_else(|| self.table.match_transcript(&normalized))?;

        tracing::debug!(%command, transcript = %normalized, ?kind, "Voice command matched");
        self.last_match = Some(now);
        self.partial = None;
        Some(command)
    }

    pub fn is_cooling_down(&self, now: Instant) -> bool {
        self.last_match
            .is_some_and(|at| now.saturating_duration_since(at) < self.cooldown)
    }

    /// The in-flight partial transcript, for display.
    pub fn partial_transcript(&self) -> Option<&str> {
        self.partial.as_deref()
    }

    pub fn clear_partial(&mut self) {
        self.partial = None;
    }
}
