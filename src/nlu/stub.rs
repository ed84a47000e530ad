//! Local stand-in for the NLU service
//!
//! Speaks the same wire protocol as the real service so the front end can be
//! exercised without a model behind it. Known inputs get canned answers,
//! anything else is echoed back.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{ChatRequest, ChatResponse};
use crate::{Error, Result};

/// Body returned by `GET /status`
pub const STATUS_TEXT: &str = "App is up and running!";

/// Canned answers keyed by exact input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StubAnswers {
    #[serde(default)]
    pub answers: HashMap<String, String>,
}

impl StubAnswers {
    /// Load answers from a TOML file with an `[answers]` table
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Add a canned answer
    #[must_use]
    pub fn with(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.answers.insert(input.into(), output.into());
        self
    }

    fn answer(&self, input: &str) -> String {
        self.answers
            .get(input)
            .cloned()
            .unwrap_or_else(|| format!("You said: {input}"))
    }
}

async fn chat(
    State(answers): State<Arc<StubAnswers>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    tracing::debug!(input = %request.chat_input, "stub chat request");
    Json(ChatResponse {
        output: Some(answers.answer(&request.chat_input)),
        end: Some(true),
    })
}

async fn status() -> &'static str {
    STATUS_TEXT
}

/// Build the stub router
pub fn router(answers: StubAnswers) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(chat))
        .route("/status", get(status))
        .with_state(Arc::new(answers))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve the stub on an already-bound listener until the task is dropped
///
/// # Errors
///
/// Returns error if the server fails
pub async fn serve(listener: TcpListener, answers: StubAnswers) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "stub NLU service listening");
    }

    axum::serve(listener, router(answers))
        .await
        .map_err(|e| Error::Config(format!("stub server error: {e}")))
}

/// Bind `0.0.0.0:<port>` and serve the stub
///
/// # Errors
///
/// Returns error if the port cannot be bound or the server fails
pub async fn run(port: u16, answers: StubAnswers) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|e| Error::Config(format!("failed to bind stub server: {e}")))?;
    serve(listener, answers).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canned_and_echo_answers() {
        let answers = StubAnswers::default().with("hello", "hi there");
        assert_eq!(answers.answer("hello"), "hi there");
        assert_eq!(answers.answer("Hello"), "You said: Hello");
    }

    #[test]
    fn test_load_answers_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.toml");
        std::fs::write(&path, "[answers]\n\"capital of germany\" = \"Berlin\"\n").unwrap();

        let answers = StubAnswers::load(&path).unwrap();
        assert_eq!(answers.answer("capital of germany"), "Berlin");
    }
}
