//! In-process stand-in for an Ollama server
//!
//! Serves `/api/tags`, `/api/generate` and `/api/chat` on a random local
//! port. Streaming replies are newline-delimited JSON like the real
//! server's.
//!
//! Generation behaviour depends on the request:
//! - model `missing` gets a 404 with an error body
//! - prompt `hang` streams one fragment and then stalls forever
//! - prompt `slow` holds back the response headers for a few seconds
//! - anything else streams `Hello`, `, `, then the prompt

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::Ipv4Addr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const MODELS: [&str; 2] = ["tinyllama:latest", "llama3:8b"];

/// How long a `slow` prompt waits before the server answers
pub const SLOW_HEADERS: Duration = Duration::from_secs(4);

pub struct MockOllama {
    pub port: u16,
}

impl MockOllama {
    pub async fn start() -> Self {
        let router = Router::new()
            .route("/api/tags", get(tags))
            .route("/api/generate", post(generate))
            .route("/api/chat", post(chat));

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("Failed to bind mock server");
        let port = listener.local_addr().expect("No local address").port();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Mock server failed");
        });

        Self { port }
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }
}

/// A port nothing listens on
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("Failed to bind");
    let port = listener.local_addr().expect("No local address").port();
    drop(listener);
    port
}

async fn tags() -> Json<Value> {
    let models: Vec<Value> = MODELS
        .iter()
        .map(|name| json!({ "name": name, "size": 637_700_138u64 }))
        .collect();
    Json(json!({ "models": models }))
}

async fn generate(Json(body): Json<Value>) -> Response {
    if let Some(response) = reject_missing_model(&body) {
        return response;
    }
    let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
    let streaming = body["stream"].as_bool().unwrap_or(true);

    if !streaming {
        return Json(json!({ "response": format!("Hello, {}", prompt), "done": true }))
            .into_response();
    }
    if prompt == "slow" {
        tokio::time::sleep(SLOW_HEADERS).await;
    }
    if prompt == "hang" {
        return stalled(json!({ "response": "partial", "done": false }));
    }

    let records = ["Hello", ", ", prompt.as_str()]
        .iter()
        .map(|fragment| json!({ "response": fragment, "done": false }))
        .chain(std::iter::once(json!({ "response": "", "done": true })))
        .collect::<Vec<_>>();
    ndjson(&records)
}

async fn chat(Json(body): Json<Value>) -> Response {
    if let Some(response) = reject_missing_model(&body) {
        return response;
    }
    let last = body["messages"]
        .as_array()
        .and_then(|messages| messages.last())
        .and_then(|message| message["content"].as_str())
        .unwrap_or_default()
        .to_string();
    let turns = body["messages"].as_array().map(Vec::len).unwrap_or(0);
    let reply = format!("You said: {} ({} messages)", last, turns);

    if body["stream"].as_bool() == Some(false) {
        return Json(json!({
            "message": { "role": "assistant", "content": reply },
            "done": true
        }))
        .into_response();
    }

    let (head, tail) = reply.split_at(reply.len() / 2);
    let records = vec![
        json!({ "message": { "role": "assistant", "content": head }, "done": false }),
        json!({ "message": { "role": "assistant", "content": tail }, "done": false }),
        json!({ "message": { "role": "assistant", "content": "" }, "done": true }),
    ];
    ndjson(&records)
}

fn reject_missing_model(body: &Value) -> Option<Response> {
    let model = body["model"].as_str().unwrap_or_default();
    if model != "missing" {
        return None;
    }
    let error = json!({ "error": format!("model '{}' not found", model) });
    Some((StatusCode::NOT_FOUND, Json(error)).into_response())
}

fn ndjson(records: &[Value]) -> Response {
    let body: String = records.iter().map(|r| format!("{}\n", r)).collect();
    ([(header::CONTENT_TYPE, "application/x-ndjson")], body).into_response()
}

fn stalled(first: Value) -> Response {
    let first = Bytes::from(format!("{}\n", first));
    let chunks = stream::once(async move { Ok::<_, Infallible>(first) }).chain(stream::pending());
    (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(chunks),
    )
        .into_response()
}
