//! Error types for the voice subsystem.

use sous_core::error::SousError;

use crate::recognizer::RecognizerState;

#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("Invalid recognizer transition: {0} -> {1}")]
    InvalidTransition(RecognizerState, RecognizerState),
    #[error("Recognizer failed: {0}")]
    Recognizer(String),
    #[error("Audio failed: {0}")]
    Audio(String),
    #[error("Session error: {0}")]
    Session(#[from] SousError),
}
