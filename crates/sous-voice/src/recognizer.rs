//! Speech recognizer boundary and lifecycle state machine.
//!
//! The recognizer itself is an external collaborator behind the
//! `Recognizer` trait. Starting is asynchronous: `start` returns before
//! audio is flowing, and `SpeechStart` arrives later. The lifecycle
//! transitions are:
//! - Idle -> Starting (start requested)
//! - Starting -> Listening (speech start reported)
//! - Listening -> Stopping (stop requested after a match)
//! - Starting | Listening | Stopping -> Idle (ended, failed, or cancelled)
//! - Starting -> Stopping (stop requested before audio started)

use std::fmt;

use async_trait::async_trait;

use crate::error::VoiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecognizerState {
    #[default]
    Idle,
    Starting,
    Listening,
    Stopping,
}

impl fmt::Display for RecognizerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognizerState::Idle => write!(f, "Idle"),
            RecognizerState::Starting => write!(f, "Starting"),
            RecognizerState::Listening => write!(f, "Listening"),
            RecognizerState::Stopping => write!(f, "Stopping"),
        }
    }
}

impl RecognizerState {
    pub fn can_transition_to(&self, target: &RecognizerState) -> bool {
        matches!(
            (self, target),
            (RecognizerState::Idle, RecognizerState::Starting)
                | (RecognizerState::Starting, RecognizerState::Listening)
                | (RecognizerState::Starting, RecognizerState::Stopping)
                | (RecognizerState::Listening, RecognizerState::Stopping)
                | (RecognizerState::Starting, RecognizerState::Idle)
                | (RecognizerState::Listening, RecognizerState::Idle)
                | (RecognizerState::Stopping, RecognizerState::Idle)
        )
    }
}

/// Owned lifecycle tracker. Transitions are only taken from the expected
/// prior state; anything else is rejected.
#[derive(Debug, Clone, Default)]
pub struct RecognizerLifecycle {
    state: RecognizerState,
}

impl RecognizerLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> RecognizerState {
        self.state
    }

    pub fn transition(&mut self, target: RecognizerState) -> Result<(), VoiceError> {
        if !self.state.can_transition_to(&target) {
            return Err(VoiceError::InvalidTransition(self.state, target));
        }
        tracing::debug!("Recognizer state: {} -> {}", self.state, target);
        self.state = target;
        Ok(())
    }

    /// Return to Idle from any active state. No-op when already idle.
    pub fn settle(&mut self) {
        if self.state != RecognizerState::Idle {
            tracing::debug!("Recognizer state: {} -> Idle", self.state);
            self.state = RecognizerState::Idle;
        }
    }
}

/// Events emitted by the external recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    SpeechStart,
    SpeechEnd,
    SpeechError(String),
    /// Final transcripts, best guess first.
    Results(Vec<String>),
    /// Provisional transcripts, refined repeatedly during an utterance.
    PartialResults(Vec<String>),
}

/// An external speech recognizer.
#[async_trait]
pub trait Recognizer: Send {
    /// Begin listening. Returns before recognition is actually running.
    async fn start(&mut self, locale: &str) -> Result<(), VoiceError>;

    async fn stop(&mut self) -> Result<(), VoiceError>;

    /// Release the recognizer. It is not started again afterwards.
    async fn destroy(&mut self) -> Result<(), VoiceError>;
}
