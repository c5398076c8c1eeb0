//! Ordered phrase table for named voice commands.
//!
//! Matching is substring containment against the normalized transcript,
//! evaluated in table order; the first entry with a matching phrase wins.
//! Entries whose phrases contain another entry's phrase must come first
//! ("continue timer" before "continue", "restart timer" before "start timer").

use std::fmt;

/// An action the cook can trigger by voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceCommand {
    /// Jump to a zero-based step index.
    GoToStep(usize),
    NextStep,
    PreviousStep,
    /// Pause the current step's timer.
    PauseTimer,
    /// Start the current step's timer.
    StartTimer,
    /// Reset the current step's timer.
    ResetTimer,
    /// Toggle the global kitchen break.
    ToggleBreak,
    /// Leave the break, or start the current timer if not on a break.
    Resume,
    /// Re-speak the current instruction.
    Repeat,
    /// Add time to the current step's timer.
    AddMinute,
    CompleteRecipe,
}

impl fmt::Display for VoiceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceCommand::GoToStep(index) => write!(f, "go_to_step({})", index),
            VoiceCommand::NextStep => write!(f, "next_step"),
            VoiceCommand::PreviousStep => write!(f, "previous_step"),
            VoiceCommand::PauseTimer => write!(f, "pause_timer"),
            VoiceCommand::StartTimer => write!(f, "start_timer"),
            VoiceCommand::ResetTimer => write!(f, "reset_timer"),
            VoiceCommand::ToggleBreak => write!(f, "toggle_break"),
            VoiceCommand::Resume => write!(f, "resume"),
            VoiceCommand::Repeat => write!(f, "repeat"),
            VoiceCommand::AddMinute => write!(f, "add_minute"),
            VoiceCommand::CompleteRecipe => write!(f, "complete_recipe"),
        }
    }
}

/// One row of the table: any of `phrases` triggers `command`.
#[derive(Debug, Clone)]
pub struct CommandEntry {
    pub phrases: &'static [&'static str],
    pub command: VoiceCommand,
}

#[derive(Debug, Clone)]
pub struct CommandTable {
    entries: Vec<CommandEntry>,
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTable {
    pub fn new() -> Self {
        let entries = vec![
            CommandEntry {
                phrases: &["continue timer", "resume"],
                command: VoiceCommand::Resume,
            },
            CommandEntry {
                phrases: &["reset timer", "restart timer"],
                command: VoiceCommand::ResetTimer,
            },
            CommandEntry {
                phrases: &["start timer", "start the timer"],
                command: VoiceCommand::StartTimer,
            },
            CommandEntry {
                phrases: &["add one minute", "add a minute"],
                command: VoiceCommand::AddMinute,
            },
            CommandEntry {
                phrases: &["i'm done", "finish recipe", "all done"],
                command: VoiceCommand::CompleteRecipe,
            },
            CommandEntry {
                phrases: &["previous step", "go back", "previous", "back"],
                command: VoiceCommand::PreviousStep,
            },
            CommandEntry {
                phrases: &["next step", "next", "continue", "ready"],
                command: VoiceCommand::NextStep,
            },
            CommandEntry {
                phrases: &["take a break", "break", "hold on"],
                command: VoiceCommand::ToggleBreak,
            },
            CommandEntry {
                phrases: &["pause", "stop"],
                command: VoiceCommand::PauseTimer,
            },
            CommandEntry {
                phrases: &["repeat", "say again"],
                command: VoiceCommand::Repeat,
            },
        ];
        Self { entries }
    }

    /// Build a table from custom entries, kept in the given order.
    pub fn from_entries(entries: Vec<CommandEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    /// First command whose phrase occurs in `normalized`.
    ///
    /// `normalized` is expected to be trimmed and lower-cased already.
    pub fn match_transcript(&self, normalized: &str) -> Option<VoiceCommand> {
        self.entries
            .iter()
            .find(|entry| entry.phrases.iter().any(|p| normalized.contains(p)))
            .map(|entry| entry.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(text: &str) -> Option<VoiceCommand> {
        CommandTable::new().match_transcript(text)
    }

    #[test]
    fn test_basic_phrases() {
        assert_eq!(matched("next step"), Some(VoiceCommand::NextStep));
        assert_eq!(matched("ready"), Some(VoiceCommand::NextStep));
        assert_eq!(matched("pause"), Some(VoiceCommand::PauseTimer));
        assert_eq!(matched("stop"), Some(VoiceCommand::PauseTimer));
        assert_eq!(matched("take a break"), Some(VoiceCommand::ToggleBreak));
        assert_eq!(matched("hold on"), Some(VoiceCommand::ToggleBreak));
        assert_eq!(matched("resume"), Some(VoiceCommand::Resume));
        assert_eq!(matched("say again"), Some(VoiceCommand::Repeat));
        assert_eq!(matched("add one minute"), Some(VoiceCommand::AddMinute));
        assert_eq!(matched("go back"), Some(VoiceCommand::PreviousStep));
        assert_eq!(matched("all done"), Some(VoiceCommand::CompleteRecipe));
    }

    #[test]
    fn test_substring_containment() {
        assert_eq!(matched("okay next step please"), Some(VoiceCommand::NextStep));
        assert_eq!(matched("can you repeat that"), Some(VoiceCommand::Repeat));
        assert_eq!(matched("next st"), Some(VoiceCommand::NextStep));
    }

    #[test]
    fn test_specific_phrases_win_over_contained_ones() {
        assert_eq!(matched("continue timer"), Some(VoiceCommand::Resume));
        assert_eq!(matched("continue"), Some(VoiceCommand::NextStep));
        assert_eq!(matched("restart timer"), Some(VoiceCommand::ResetTimer));
        assert_eq!(matched("start timer"), Some(VoiceCommand::StartTimer));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(matched(""), None);
        assert_eq!(matched("how much salt"), None);
        assert_eq!(matched("go to step nine"), None);
    }

    #[test]
    fn test_custom_table_order() {
        let table = CommandTable::from_entries(vec![CommandEntry {
            phrases: &["stop"],
            command: VoiceCommand::ToggleBreak,
        }]);
        assert_eq!(table.match_transcript("stop"), Some(VoiceCommand::ToggleBreak));
        assert_eq!(table.match_transcript("next"), None);
        assert_eq!(table.entries().len(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(VoiceCommand::GoToStep(2).to_string(), "go_to_step(2)");
        assert_eq!(VoiceCommand::ToggleBreak.to_string(), "toggle_break");
    }
}
