//! "Go to step N" parsing.
//!
//! Accepts an optional lead-in ("go to", "jump to", "move to"), the word
//! "step", then a number given as digits or as an English number word.

use regex::Regex;

/// Spoken number words and their values.
pub const NUMBER_WORDS: &[(&str, u32)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("twenty", 20),
];

pub struct StepNumberParser {
    regex: Regex,
}

impl Default for StepNumberParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StepNumberParser {
    pub fn new() -> Self {
        // Longest words first so "fourteen" is not read as "four".
        let mut words: Vec<&str> = NUMBER_WORDS.iter().map(|(w, _)| *w).collect();
        words.sort_by_key(|w| std::cmp::Reverse(w.len()));
        let pattern = format!(
            r"\b(?:(?:go|jump|move)\s+to\s+)?step\s+(\d+|{})\b",
            words.join("|")
        );
        Self {
            regex: Regex::new(&pattern).expect("Invalid step number regex"),
        }
    }

    /// The one-based step number spoken in `normalized`, if any.
    pub fn parse(&self, normalized: &str) -> Option<u32> {
        let caps = self.regex.captures(normalized)?;
        let token = caps.get(1)?.as_str();
        word_value(token).or_else(|| token.parse().ok())
    }

    /// Zero-based index for a recipe with `step_count` steps.
    ///
    /// Numbers outside `[1, step_count]` resolve to `None`.
    pub fn resolve(&self, normalized: &str, step_count: usize) -> Option<usize> {
        let number = usize::try_from(self.parse(normalized)?).ok()?;
        (1..=step_count).contains(&number).then(|| number - 1)
    }
}

fn word_value(token: &str) -> Option<u32> {
    NUMBER_WORDS
        .iter()
        .find(|(w, _)| *w == token)
        .map(|(_, v)| *v)
}
