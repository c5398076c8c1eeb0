//! Spoken instructions with latest-request-wins playback.
//!
//! Every speak request takes a token from a strictly increasing counter.
//! Synthesis is slow and the cook can move on before it finishes, so the
//! token is compared again before playback starts and once playback
//! returns. A request whose token is no longer the latest releases its
//! audio and gives up.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::VoiceError;

/// Monotonic playback token source.
#[derive(Debug, Default)]
pub struct PlaybackTokens {
    latest: AtomicU64,
}

impl PlaybackTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token, invalidating every earlier one.
    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.latest() == token
    }
}

/// Text-to-speech and playback device.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    type Handle: Send;

    /// Produce playable audio. `Ok(None)` means synthesis is unavailable.
    async fn synthesize(&self, text: &str) -> Result<Option<Self::Handle>, VoiceError>;

    async fn play(&self, handle: &Self::Handle) -> Result<(), VoiceError>;

    /// Stop whatever is playing.
    async fn stop(&self) -> Result<(), VoiceError>;

    /// Unload audio that will not be played again.
    async fn release(&self, handle: Self::Handle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    Played,
    /// A newer request took over first.
    Superseded,
    /// Synthesis produced nothing; nothing was played.
    Unavailable,
}

pub struct Narrator<A: AudioBackend> {
    backend: Arc<A>,
    tokens: Arc<PlaybackTokens>,
}

impl<A: AudioBackend> Clone for Narrator<A> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

impl<A: AudioBackend> Narrator<A> {
    pub fn new(backend: Arc<A>) -> Self {
        Self {
            backend,
            tokens: Arc::new(PlaybackTokens::new()),
        }
    }

    /// Reserve the next playback slot, invalidating every earlier request.
    ///
    /// Callers that hand the request to another task take the token here,
    /// before spawning, so request order is the order of these calls.
    pub fn begin(&self) -> u64 {
        self.tokens.issue()
    }

    /// Speak `text`, stopping anything already playing.
    ///
    /// Synthesis failures are logged and reported as `Unavailable`.
    pub async fn speak(&self, text: &str) -> Result<SpeakOutcome, VoiceError> {
        let token = self.begin();
        self.speak_with(token, text).await
    }

    /// Speak `text` under a token from `begin`.
    pub async fn speak_with(&self, token: u64, text: &str) -> Result<SpeakOutcome, VoiceError> {
        if !self.tokens.is_current(token) {
            return Ok(SpeakOutcome::Superseded);
        }
        self.backend.stop().await?;

        let handle = match self.backend.synthesize(text).await {
            Ok(Some(handle)) => handle,
            Ok(None) => return Ok(SpeakOutcome::Unavailable),
            Err(e) => {
                warn!(error = %e, "Speech synthesis failed");
                return Ok(SpeakOutcome::Unavailable);
            }
        };

        if !self.tokens.is_current(token) {
            debug!(token, latest = self.tokens.latest(), "Dropping stale narration");
            self.backend.release(handle).await;
            return Ok(SpeakOutcome::Superseded);
        }

        let played = self.backend.play(&handle).await;
        self.backend.release(handle).await;
        played?;

        if self.tokens.is_current(token) {
            Ok(SpeakOutcome::Played)
        } else {
            Ok(SpeakOutcome::Superseded)
        }
    }

    /// Invalidate pending requests and stop playback.
    pub async fn cancel(&self) -> Result<(), VoiceError> {
        let token = self.begin();
        self.cancel_with(token).await
    }

    /// Stop playback for a cancellation taken with `begin`. A newer request
    /// owns the device by the time this runs, so it is left alone.
    pub async fn cancel_with(&self, token: u64) -> Result<(), VoiceError> {
        if !self.tokens.is_current(token) {
            return Ok(());
        }
        self.backend.stop().await
    }
}
