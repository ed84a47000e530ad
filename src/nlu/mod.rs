//! Remote NLU service client
//!
//! The service takes `{chat_input, chat_history}` on `POST /chat` and
//! answers with `{output}`. History is always sent empty.

mod http;
pub mod stub;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpNluClient;

/// Failure talking to the NLU service
///
/// `Display` renders the bare detail; callers add their own prefix.
#[derive(Debug, thiserror::Error)]
pub enum NluError {
    /// Request never produced a response (connect, timeout, body read)
    #[error("{0}")]
    Transport(String),

    /// Service answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON
    #[error("invalid response: {0}")]
    Decode(String),

    /// Response JSON had no `output` field
    #[error("response has no `output` field")]
    MissingOutput,
}

impl From<reqwest::Error> for NluError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Request body for `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The current utterance
    pub chat_input: String,

    /// Prior `(input, output)` turns
    pub chat_history: Vec<(String, String)>,
}

impl ChatRequest {
    /// Build a single-turn request with empty history
    #[must_use]
    pub fn new(chat_input: impl Into<String>) -> Self {
        Self {
            chat_input: chat_input.into(),
            chat_history: Vec::new(),
        }
    }
}

/// Response body from `POST /chat`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub output: Option<String>,

    /// Set by some services to mark the conversation finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<bool>,
}

impl ChatResponse {
    /// Extract the answer text
    ///
    /// # Errors
    ///
    /// Returns `NluError::MissingOutput` if the service sent no `output`
    pub fn into_output(self) -> Result<String, NluError> {
        self.output.ok_or(NluError::MissingOutput)
    }
}

/// Client for a natural-language-understanding service
#[async_trait]
pub trait NluClient: Send + Sync {
    /// Send one chat turn and return the answer text
    async fn chat(&self, request: &ChatRequest) -> Result<String, NluError>;

    /// Query the service's status endpoint
    async fn status(&self) -> Result<String, NluError>;
}
