use thiserror::Error;

/// Top-level error type for the Sous system.
///
/// Session operations themselves never fail: out-of-range steps, unknown
/// timer ids, and unmatched transcripts are absorbed as no-ops. These
/// variants cover the infrastructure around the session (config files,
/// the durable store, the recognizer and audio backends).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SousError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Voice error: {0}")]
    Voice(String),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Session lock poisoned: {0}")]
    SessionLock(String),
}

impl From<toml::de::Error> for SousError {
    fn from(err: toml::de::Error) -> Self {
        SousError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SousError {
    fn from(err: toml::ser::Error) -> Self {
        SousError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SousError {
    fn from(err: serde_json::Error) -> Self {
        SousError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Sous operations.
pub type Result<T> = std::result::Result<T, SousError>;
