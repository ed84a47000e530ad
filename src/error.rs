//! Error types for Hark

use thiserror::Error;

use crate::nlu::NluError;

/// Result type alias for Hark operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Hark
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Speech capture is not available on this platform
    #[error("capture unsupported: {0}")]
    CaptureUnsupported(String),

    /// Speech capture failed mid-session
    #[error("capture error: {0}")]
    Capture(String),

    /// NLU service call failed
    #[error("NLU processing failed: {0}")]
    Nlu(#[from] NluError),

    /// Another interaction is still in flight
    #[error("busy: an interaction is already in progress")]
    Busy,

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Answer cache error
    #[error("cache error: {0}")]
    Cache(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
