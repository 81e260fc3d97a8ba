// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Integration tests for the Gemini summarizer against a local fake endpoint

use axum::Router;
use axum::extract::{Json, Path};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use digest_ai::{AiError, GeminiSummarizer, Summarizer};
use serde_json::{Value, json};
use similar_asserts::assert_eq;

async fn spawn_fake_gemini() -> String {
    let router = Router::new().route(
        "/v1beta/models/{call}",
        post(
            |Path(call): Path<String>,
             headers: HeaderMap,
             Json(body): Json<Value>| async move {
                let key = headers
                    .get("x-goog-api-key")
                    .and_then(|v| v.to_str().ok());
                if key != Some("test-key") {
                    return Err((StatusCode::FORBIDDEN, "API key not valid".to_string()));
                }
                let Some(model) = call.strip_suffix(":generateContent") else {
                    return Err((StatusCode::NOT_FOUND, "unknown method".to_string()));
                };
                if model == "overloaded" {
                    return Err((StatusCode::SERVICE_UNAVAILABLE, "model overloaded".to_string()));
                }

                let prompt = body["contents"][0]["parts"][0]["text"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                let changed = prompt
                    .lines()
                    .filter(|l| l.starts_with('+') && !l.starts_with("+++"))
                    .count();
                let reply = json!({
                    "candidates": [{
                        "content": {
                            "role": "model",
                            "parts": [{"text": format!("* {model} saw {changed} added lines\n")}]
                        }
                    }]
                });
                Ok(Json(reply))
            },
        ),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_summarize_diff_returns_model_text() {
    let base = spawn_fake_gemini().await;
    let summarizer = GeminiSummarizer::new("test-key", "gemini-1.5-flash")
        .expect("summarizer")
        .with_api_base(base);

    let diff = "diff --git a/a.rs b/a.rs\n+one\n+two\n-three\n";
    let summary = summarizer.summarize_diff(diff).await.expect("summary");

    assert_eq!(summary, "* gemini-1.5-flash saw 2 added lines");
}

#[tokio::test]
async fn test_summarize_diff_bad_key_is_status_error() {
    let base = spawn_fake_gemini().await;
    let summarizer = GeminiSummarizer::new("wrong-key", "gemini-1.5-flash")
        .expect("summarizer")
        .with_api_base(base);

    let err = summarizer
        .summarize_diff("+x\n")
        .await
        .expect_err("should fail");

    match err {
        AiError::Status { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("API key not valid"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_summarize_diff_server_error() {
    let base = spawn_fake_gemini().await;
    let summarizer = GeminiSummarizer::new("test-key", "overloaded")
        .expect("summarizer")
        .with_api_base(base);

    let err = summarizer
        .summarize_diff("+x\n")
        .await
        .expect_err("should fail");

    assert!(matches!(err, AiError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_summarize_diff_truncates_large_input() {
    let base = spawn_fake_gemini().await;
    let summarizer = GeminiSummarizer::new("test-key", "gemini-1.5-flash")
        .expect("summarizer")
        .with_api_base(base)
        .with_max_diff_chars(9);

    // Nine characters keep "+ab", "+cd" and a lone "+"
    let diff = "+ab\n+cd\n+ef\n+gh\n";
    let summary = summarizer.summarize_diff(diff).await.expect("summary");

    assert_eq!(summary, "* gemini-1.5-flash saw 3 added lines");
}

#[tokio::test]
async fn test_transport_error_does_not_reveal_api_key() {
    // Nothing listens on port 1, so the request fails before any response
    let summarizer = GeminiSummarizer::new("SECRET-KEY-123", "gemini-1.5-flash")
        .expect("summarizer")
        .with_api_base("http://127.0.0.1:1");

    let err = summarizer
        .summarize_diff("+x\n")
        .await
        .expect_err("connection should fail");

    assert!(matches!(err, AiError::Http(_)));
    let rendered = format!("{err} {err:?}");
    assert!(
        !rendered.contains("SECRET-KEY-123"),
        "api key leaked into error: {rendered}"
    );
}
