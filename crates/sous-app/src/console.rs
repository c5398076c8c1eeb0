//! Terminal adapters: stdin as a speech recognizer, stdout as the speaker,
//! and a bell for finished timers.

use async_trait::async_trait;
use sous_core::types::{TimerState, Timestamp};
use sous_session::{CompletionAlert, SessionView};
use sous_voice::{AudioBackend, Recognizer, RecognizerEvent, VoiceError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Map one stdin line to recognizer events.
///
/// `~text` is a partial transcript. Any other non-empty line is a final
/// transcript followed by the end of the utterance.
pub fn line_to_events(line: &str) -> Vec<RecognizerEvent> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }
    match line.strip_prefix('~') {
        Some(partial) => vec![RecognizerEvent::PartialResults(vec![partial.trim().to_string()])],
        None => vec![
            RecognizerEvent::Results(vec![line.to_string()]),
            RecognizerEvent::SpeechEnd,
        ],
    }
}

/// Forward stdin lines as recognizer events until stdin closes.
pub fn spawn_stdin_reader(events: mpsc::UnboundedSender<RecognizerEvent>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    for event in line_to_events(&line) {
                        if events.send(event).is_err() {
                            return;
                        }
                    }
                }
                Ok(None) => return,
                Err(e) => {
                    let _ = events.send(RecognizerEvent::SpeechError(e.to_string()));
                    return;
                }
            }
        }
    });
}

/// Recognizer over the terminal. Reports speech start as soon as it is
/// started; transcripts come from `spawn_stdin_reader`, which keeps reading
/// whether or not anyone is listening.
pub struct ConsoleRecognizer {
    events: mpsc::UnboundedSender<RecognizerEvent>,
}

impl ConsoleRecognizer {
    pub fn new(events: mpsc::UnboundedSender<RecognizerEvent>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl Recognizer for ConsoleRecognizer {
    async fn start(&mut self, locale: &str) -> Result<(), VoiceError> {
        tracing::debug!(locale, "Console recognizer listening");
        self.events
            .send(RecognizerEvent::SpeechStart)
            .map_err(|e| VoiceError::Recognizer(e.to_string()))
    }

    async fn stop(&mut self) -> Result<(), VoiceError> {
        Ok(())
    }

    async fn destroy(&mut self) -> Result<(), VoiceError> {
        tracing::debug!("Console recognizer released");
        Ok(())
    }
}

/// Prints narration instead of synthesizing audio.
#[derive(Debug, Default)]
pub struct ConsoleAudio;

#[async_trait]
impl AudioBackend for ConsoleAudio {
    type Handle = String;

    async fn synthesize(&self, text: &str) -> Result<Option<String>, VoiceError> {
        let text = text.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }

    async fn play(&self, handle: &String) -> Result<(), VoiceError> {
        println!("  >> {}", handle);
        Ok(())
    }

    async fn stop(&self) -> Result<(), VoiceError> {
        Ok(())
    }

    async fn release(&self, _handle: String) {}
}

/// Rings the terminal bell when a timer finishes.
#[derive(Debug, Default)]
pub struct BellAlert;

impl CompletionAlert for BellAlert {
    fn timer_completed(&self, timer: &TimerState) {
        tracing::info!(label = %timer.label, "Timer finished");
        eprintln!("\x07  Timer finished: {}", timer.label);
    }
}

pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

pub fn format_timestamp(ts: Timestamp) -> String {
    ts.to_datetime().format("%Y-%m-%d %H:%M UTC").to_string()
}

/// One-line summary of the session view.
pub fn format_view(view: &SessionView) -> String {
    let mut line = format!(
        "[{}] Step {}/{}: {}",
        view.recipe_title,
        view.step_index + 1,
        view.step_count,
        view.instruction
    );
    if let Some(ref timer) = view.timer {
        let state = if timer.is_complete {
            "done"
        } else if timer.is_running {
            "running"
        } else {
            "stopped"
        };
        line.push_str(&format!(" ({} {})", format_clock(timer.remaining_seconds), state));
    }
    if view.is_paused {
        line.push_str(" [break]");
    }
    if view.is_completed {
        line.push_str(" [finished]");
    }
    line
}
