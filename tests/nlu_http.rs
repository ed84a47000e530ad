//! NLU HTTP client integration tests
//!
//! Serves the stub router (or a hand-built one) on a loopback port and talks
//! to it with the real client

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use hark::config::{NluConfig, parse_base_url};
use hark::nlu::stub::{self, STATUS_TEXT, StubAnswers};
use hark::{ChatRequest, HttpNluClient, NluClient, NluError};
use tokio::net::TcpListener;

/// Serve `router` on an ephemeral port; returns the base URL
async fn spawn_router(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn spawn_stub(answers: StubAnswers) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(stub::serve(listener, answers));
    format!("http://{addr}")
}

fn client(base: &str) -> HttpNluClient {
    let config = NluConfig {
        base_url: parse_base_url(base).unwrap(),
        timeout: Some(Duration::from_secs(5)),
    };
    HttpNluClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_chat_returns_canned_answer() {
    let base = spawn_stub(StubAnswers::default().with("hello", "hi there")).await;

    let answer = client(&base)
        .chat(&ChatRequest::new("hello"))
        .await
        .unwrap();

    assert_eq!(answer, "hi there");
}

#[tokio::test]
async fn test_chat_echoes_unknown_input() {
    let base = spawn_stub(StubAnswers::default()).await;

    let answer = client(&base)
        .chat(&ChatRequest::new("what time is it"))
        .await
        .unwrap();

    assert_eq!(answer, "You said: what time is it");
}

#[tokio::test]
async fn test_base_url_with_chat_suffix() {
    let base = spawn_stub(StubAnswers::default().with("hello", "hi there")).await;

    let answer = client(&format!("{base}/chat"))
        .chat(&ChatRequest::new("hello"))
        .await
        .unwrap();

    assert_eq!(answer, "hi there");
}

#[tokio::test]
async fn test_status_text() {
    let base = spawn_stub(StubAnswers::default()).await;

    let body = client(&base).status().await.unwrap();

    assert_eq!(body, STATUS_TEXT);
}

#[tokio::test]
async fn test_request_body_wire_shape() {
    let seen: Arc<Mutex<Vec<serde_json::Value>>> = Arc::default();

    let router = Router::new()
        .route(
            "/chat",
            post(
                |State(seen): State<Arc<Mutex<Vec<serde_json::Value>>>>,
                 Json(body): Json<serde_json::Value>| async move {
                    seen.lock().unwrap().push(body);
                    Json(serde_json::json!({ "output": "hi there" }))
                },
            ),
        )
        .with_state(seen.clone());
    let base = spawn_router(router).await;

    client(&base)
        .chat(&ChatRequest::new("hello"))
        .await
        .unwrap();

    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[serde_json::json!({ "chat_input": "hello", "chat_history": [] })]
    );
}

#[tokio::test]
async fn test_server_error_status() {
    let router = Router::new().route(
        "/chat",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model crashed") }),
    );
    let base = spawn_router(router).await;

    let err = client(&base)
        .chat(&ChatRequest::new("hello"))
        .await
        .unwrap_err();

    match err {
        NluError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "model crashed");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_body_is_decode_error() {
    let router = Router::new().route("/chat", post(|| async { "<html>oops</html>" }));
    let base = spawn_router(router).await;

    let err = client(&base)
        .chat(&ChatRequest::new("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, NluError::Decode(_)));
}

#[tokio::test]
async fn test_missing_output_field() {
    let router = Router::new().route(
        "/chat",
        post(|| async { Json(serde_json::json!({ "end": true })) }),
    );
    let base = spawn_router(router).await;

    let err = client(&base)
        .chat(&ChatRequest::new("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, NluError::MissingOutput));
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}"))
        .chat(&ChatRequest::new("hello"))
        .await
        .unwrap_err();

    assert!(matches!(err, NluError::Transport(_)));
    assert!(!err.to_string().starts_with("Error occurred"));
}
