//! Voice input controller.
//!
//! Owns the recognizer, its lifecycle state machine, and the interpreter.
//! Recognizer events go in, matched commands come out. The controller
//! never touches the session; callers dispatch the returned command.
//!
//! Recognizer failures are logged and answered with a delayed restart while
//! voice input is enabled. They are never surfaced as errors from
//! `handle_event`.

use std::time::{Duration, Instant};

use sous_core::config::VoiceConfig;
use tracing::{debug, info, warn};

use crate::commands::VoiceCommand;
use crate::error::VoiceError;
use crate::interpreter::{TranscriptKind, VoiceInterpreter};
use crate::recognizer::{Recognizer, RecognizerEvent, RecognizerLifecycle, RecognizerState};

pub struct VoiceController<R: Recognizer> {
    recognizer: R,
    lifecycle: RecognizerLifecycle,
    interpreter: VoiceInterpreter,
    locale: String,
    restart_delay: Duration,
    enabled: bool,
}

impl<R: Recognizer> VoiceController<R> {
    pub fn new(recognizer: R, config: &VoiceConfig) -> Self {
        Self {
            recognizer,
            lifecycle: RecognizerLifecycle::new(),
            interpreter: VoiceInterpreter::new(config.command_cooldown()),
            locale: config.locale.clone(),
            restart_delay: config.restart_delay(),
            enabled: config.enabled,
        }
    }

    pub fn state(&self) -> RecognizerState {
        self.lifecycle.current()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn partial_transcript(&self) -> Option<&str> {
        self.interpreter.partial_transcript()
    }

    pub fn recognizer(&self) -> &R {
        &self.recognizer
    }

    /// Ask the recognizer to start listening.
    ///
    /// Returns `Ok(false)` without calling the recognizer when voice input
    /// is disabled or a start is already in flight.
    pub async fn start(&mut self) -> Result<bool, VoiceError> {
        if !self.enabled {
            return Ok(false);
        }
        if self.lifecycle.current() != RecognizerState::Idle {
            debug!(state = %self.lifecycle.current(), "Recognizer start skipped");
            return Ok(false);
        }

        self.lifecycle.transition(RecognizerState::Starting)?;
        if let Err(e) = self.recognizer.start(&self.locale).await {
            self.lifecycle.settle();
            return Err(e);
        }
        Ok(true)
    }

    /// Ask the recognizer to stop. No-op unless it is starting or listening.
    pub async fn stop(&mut self) -> Result<(), VoiceError> {
        match self.lifecycle.current() {
            RecognizerState::Starting | RecognizerState::Listening => {
                self.lifecycle.transition(RecognizerState::Stopping)?;
                self.recognizer.stop().await
            }
            RecognizerState::Idle | RecognizerState::Stopping => Ok(()),
        }
    }

    pub async fn enable(&mut self) -> Result<bool, VoiceError> {
        self.enabled = true;
        info!("Voice input enabled");
        self.start().await
    }

    pub async fn disable(&mut self) -> Result<(), VoiceError> {
        self.enabled = false;
        self.interpreter.clear_partial();
        info!("Voice input disabled");
        self.stop().await
    }

    /// Feed one recognizer event. Returns the matched command, if any.
    pub async fn handle_event(
        &mut self,
        event: RecognizerEvent,
        step_count: usize,
    ) -> Option<VoiceCommand> {
        match event {
            RecognizerEvent::SpeechStart => {
                if self.lifecycle.current() == RecognizerState::Starting {
                    let _ = self.lifecycle.transition(RecognizerState::Listening);
                }
                None
            }
            RecognizerEvent::PartialResults(transcripts) => {
                self.on_transcripts(transcripts, TranscriptKind::Partial, step_count)
                    .await
            }
            RecognizerEvent::Results(transcripts) => {
                self.on_transcripts(transcripts, TranscriptKind::Final, step_count)
                    .await
            }
            RecognizerEvent::SpeechEnd => {
                self.on_session_end().await;
                None
            }
            RecognizerEvent::SpeechError(message) => {
                warn!(error = %message, "Speech recognizer error");
                self.on_session_end().await;
                None
            }
        }
    }

    /// Stop listening for good and release the recognizer.
    pub async fn shutdown(&mut self) -> Result<(), VoiceError> {
        self.enabled = false;
        self.stop().await?;
        self.lifecycle.settle();
        self.recognizer.destroy().await
    }

    async fn on_transcripts(
        &mut self,
        transcripts: Vec<String>,
        kind: TranscriptKind,
        step_count: usize,
    ) -> Option<VoiceCommand> {
        let transcript = transcripts.into_iter().next()?;
        let command = self
            .interpreter
            .interpret(&transcript, kind, step_count, Instant::now())?;

        // Trailing audio from the same utterance must not re-trigger.
        if let Err(e) = self.stop().await {
            warn!(error = %e, "Failed to stop recognizer after match");
        }
        Some(command)
    }

    /// End of a recognition session. While a start is in flight the event
    /// belongs to an earlier session and must not clear the guard.
    async fn on_session_end(&mut self) {
        if self.lifecycle.current() == RecognizerState::Starting {
            debug!("Recognizer end ignored, start in flight");
            return;
        }
        self.lifecycle.settle();
        self.restart_after_delay().await;
    }

    async fn restart_after_delay(&mut self) {
        if !self.enabled {
            return;
        }
        tokio::time::sleep(self.restart_delay).await;
        match self.start().await {
            Ok(true) => debug!("Recognizer restarted"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Recognizer restart failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Debug, Default)]
    struct FakeRecognizer {
        starts: usize,
        stops: usize,
        destroyed: bool,
        fail_start: bool,
        locale: Option<String>,
    }

    #[async_trait]
    impl Recognizer for FakeRecognizer {
        async fn start(&mut self, locale: &str) -> Result<(), VoiceError> {
            self.starts += 1;
            self.locale = Some(locale.to_string());
            if self.fail_start {
                return Err(VoiceError::Recognizer("microphone unavailable".into()));
            }
            Ok(())
        }

        async fn stop(&mut self) -> Result<(), VoiceError> {
            self.stops += 1;
            Ok(())
        }

        async fn destroy(&mut self) -> Result<(), VoiceError> {
            self.destroyed = true;
            Ok(())
        }
    }

    fn config() -> VoiceConfig {
        VoiceConfig {
            restart_delay_ms: 5,
            locale: "en-GB".into(),
            ..Default::default()
        }
    }

    fn controller() -> VoiceController<FakeRecognizer> {
        VoiceController::new(FakeRecognizer::default(), &config())
    }

    fn partial(text: &str) -> RecognizerEvent {
        RecognizerEvent::PartialResults(vec![text.to_string()])
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    #[tokio::test]
    async fn test_start_passes_locale() {
        let mut ctrl = controller();
        assert!(ctrl.start().await.unwrap());
        assert_eq!(ctrl.state(), RecognizerState::Starting);
        assert_eq!(ctrl.recognizer().locale.as_deref(), Some("en-GB"));

        ctrl.handle_event(RecognizerEvent::SpeechStart, 3).await;
        assert_eq!(ctrl.state(), RecognizerState::Listening);
    }

    #[tokio::test]
    async fn test_start_in_flight_guard() {
        let mut ctrl = controller();
        assert!(ctrl.start().await.unwrap());
        assert!(!ctrl.start().await.unwrap());
        assert!(!ctrl.start().await.unwrap());
        assert_eq!(ctrl.recognizer().starts, 1);
    }

    #[tokio::test]
    async fn test_failed_start_returns_to_idle() {
        let mut ctrl = VoiceController::new(
            FakeRecognizer {
                fail_start: true,
                ..Default::default()
            },
            &config(),
        );
        assert!(ctrl.start().await.is_err());
        assert_eq!(ctrl.state(), RecognizerState::Idle);
    }

    #[tokio::test]
    async fn test_disabled_controller_never_starts() {
        let mut ctrl = VoiceController::new(
            FakeRecognizer::default(),
            &VoiceConfig {
                enabled: false,
                ..config()
            },
        );
        assert!(!ctrl.start().await.unwrap());
        ctrl.handle_event(RecognizerEvent::SpeechEnd, 3).await;
        assert_eq!(ctrl.recognizer().starts, 0);

        assert!(ctrl.enable().await.unwrap());
        assert_eq!(ctrl.recognizer().starts, 1);
    }

    #[tokio::test]
    async fn test_speech_end_restarts_when_enabled() {
        let mut ctrl = controller();
        ctrl.start().await.unwrap();
        ctrl.handle_event(RecognizerEvent::SpeechStart, 3).await;
        ctrl.handle_event(RecognizerEvent::SpeechEnd, 3).await;
        assert_eq!(ctrl.recognizer().starts, 2);
        assert_eq!(ctrl.state(), RecognizerState::Starting);
    }

    #[tokio::test]
    async fn test_speech_error_restarts_when_enabled() {
        let mut ctrl = controller();
        ctrl.start().await.unwrap();
        ctrl.handle_event(RecognizerEvent::SpeechStart, 3).await;
        ctrl.handle_event(RecognizerEvent::SpeechError("no match".into()), 3)
            .await;
        assert_eq!(ctrl.recognizer().starts, 2);
    }

    #[tokio::test]
    async fn test_late_error_does_not_overlap_restart() {
        let mut ctrl = controller();
        ctrl.start().await.unwrap();
        ctrl.handle_event(RecognizerEvent::SpeechStart, 3).await;
        ctrl.handle_event(RecognizerEvent::SpeechEnd, 3).await;
        assert_eq!(ctrl.state(), RecognizerState::Starting);

        ctrl.handle_event(RecognizerEvent::SpeechError("client error".into()), 3)
            .await;
        ctrl.handle_event(RecognizerEvent::SpeechEnd, 3).await;
        assert_eq!(ctrl.recognizer().starts, 2);
        assert_eq!(ctrl.state(), RecognizerState::Starting);

        ctrl.handle_event(RecognizerEvent::SpeechStart, 3).await;
        ctrl.handle_event(RecognizerEvent::SpeechEnd, 3).await;
        assert_eq!(ctrl.recognizer().starts, 3);
    }

    #[tokio::test]
    async fn test_end_after_failed_restart_retries() {
        let mut ctrl = controller();
        ctrl.start().await.unwrap();
        ctrl.handle_event(RecognizerEvent::SpeechStart, 3).await;
        ctrl.recognizer.fail_start = true;
        ctrl.handle_event(RecognizerEvent::SpeechEnd, 3).await;
        assert_eq!(ctrl.state(), RecognizerState::Idle);

        ctrl.recognizer.fail_start = false;
        ctrl.handle_event(RecognizerEvent::SpeechError("no speech".into()), 3)
            .await;
        assert_eq!(ctrl.recognizer().starts, 3);
        assert_eq!(ctrl.state(), RecognizerState::Starting);
    }

    #[tokio::test]
    async fn test_disable_stops_and_suppresses_restart() {
        let mut ctrl = controller();
        ctrl.start().await.unwrap();
        ctrl.handle_event(RecognizerEvent::SpeechStart, 3).await;
        ctrl.disable().await.unwrap();
        assert_eq!(ctrl.state(), RecognizerState::Stopping);
        assert_eq!(ctrl.recognizer().stops, 1);

        ctrl.handle_event(RecognizerEvent::SpeechEnd, 3).await;
        assert_eq!(ctrl.state(), RecognizerState::Idle);
        assert_eq!(ctrl.recognizer().starts, 1);
    }

    #[tokio::test]
    async fn test_shutdown_destroys_recognizer() {
        let mut ctrl = controller();
        ctrl.start().await.unwrap();
        ctrl.shutdown().await.unwrap();
        assert!(ctrl.recognizer().destroyed);
        assert!(!ctrl.is_enabled());
        assert_eq!(ctrl.state(), RecognizerState::Idle);
    }

    // =========================================================================
    // Transcripts
    // =========================================================================

    #[tokio::test]
    async fn test_match_stops_recognizer() {
        let mut ctrl = controller();
        ctrl.start().await.unwrap();
        ctrl.handle_event(RecognizerEvent::SpeechStart, 3).await;

        let command = ctrl.handle_event(partial("next step"), 3).await;
        assert_eq!(command, Some(VoiceCommand::NextStep));
        assert_eq!(ctrl.state(), RecognizerState::Stopping);
        assert_eq!(ctrl.recognizer().stops, 1);
    }

    #[tokio::test]
    async fn test_only_first_transcript_is_read() {
        let mut ctrl = controller();
        ctrl.start().await.unwrap();
        let command = ctrl
            .handle_event(
                RecognizerEvent::Results(vec!["hello".into(), "next step".into()]),
                3,
            )
            .await;
        assert_eq!(command, None);
        assert_eq!(ctrl.handle_event(RecognizerEvent::Results(vec![]), 3).await, None);
    }

    #[tokio::test]
    async fn test_partial_burst_dispatches_once() {
        let mut ctrl = controller();
        ctrl.start().await.unwrap();
        ctrl.handle_event(RecognizerEvent::SpeechStart, 3).await;

        assert_eq!(
            ctrl.handle_event(partial("next st"), 3).await,
            Some(VoiceCommand::NextStep)
        );
        assert_eq!(ctrl.handle_event(partial("next step"), 3).await, None);
        assert_eq!(
            ctrl.handle_event(RecognizerEvent::Results(vec!["next step".into()]), 3)
                .await,
            None
        );
    }

    #[tokio::test]
    async fn test_partial_transcript_exposed_until_match() {
        let mut ctrl = controller();
        ctrl.start().await.unwrap();
        ctrl.handle_event(partial("Go to"), 5).await;
        assert_eq!(ctrl.partial_transcript(), Some("go to"));

        let command = ctrl.handle_event(partial("go to step two"), 5).await;
        assert_eq!(command, Some(VoiceCommand::GoToStep(1)));
        assert_eq!(ctrl.partial_transcript(), None);
    }
}
