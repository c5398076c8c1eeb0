//! Sous Voice crate - hands-free control of a cooking session.
//!
//! Turns recognizer transcripts into session operations:
//! - `commands` and `step_number` hold the ordered phrase table and the
//!   "go to step N" parser
//! - `interpreter` normalizes transcripts and applies the command cooldown
//! - `recognizer` and `controller` drive the external speech recognizer
//! - `dispatch` applies a matched command to the session
//! - `narration` speaks instructions with latest-request-wins playback

pub mod commands;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod interpreter;
pub mod narration;
pub mod recognizer;
pub mod step_number;

pub use commands::{CommandTable, VoiceCommand};
pub use controller::VoiceController;
pub use dispatch::{dispatch, DispatchOutcome};
pub use error::VoiceError;
pub use interpreter::{TranscriptKind, VoiceInterpreter};
pub use narration::{AudioBackend, Narrator, PlaybackTokens, SpeakOutcome};
pub use recognizer::{Recognizer, RecognizerEvent, RecognizerLifecycle, RecognizerState};
pub use step_number::StepNumberParser;
