//! Mock Anthropic Messages API backend
//!
//! Answers `/v1/messages` with canned responses in the native protocol,
//! including the SSE event sequence a real stream produces, and captures
//! the request body and auth headers for assertions.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

/// What the mock saw in the most recent messages request
#[derive(Debug, Clone)]
pub struct CapturedMessages {
    /// Raw JSON request body
    pub body: Value,
    /// Value of the `x-api-key` header, if any
    pub api_key: Option<String>,
    /// Value of the `anthropic-version` header, if any
    pub version: Option<String>,
}

struct MockState {
    message_count: AtomicU32,
    captured: Mutex<Option<CapturedMessages>>,
}

/// In-process server speaking the Anthropic Messages protocol
pub struct MockAnthropic {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

impl MockAnthropic {
    /// Start the mock server
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            message_count: AtomicU32::new(0),
            captured: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/messages", routing::post(handle_messages))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for pointing a provider at this mock
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Number of messages requests received
    pub fn message_count(&self) -> u32 {
        self.state.message_count.load(Ordering::Relaxed)
    }

    /// The most recent messages request, if one arrived
    pub fn captured(&self) -> Option<CapturedMessages> {
        self.state.captured.lock().unwrap().clone()
    }
}

impl Drop for MockAnthropic {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_messages(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.message_count.fetch_add(1, Ordering::Relaxed);

    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };
    *state.captured.lock().unwrap() = Some(CapturedMessages {
        body: body.clone(),
        api_key: header_value("x-api-key"),
        version: header_value("anthropic-version"),
    });

    let model = body["model"].as_str().unwrap_or("claude-3-haiku-20240307").to_owned();

    if body["stream"].as_bool().unwrap_or(false) {
        let body = stream_body(&model);
        return (StatusCode::OK, [(header::CONTENT_TYPE, "text/event-stream")], body).into_response();
    }

    let (content, stop_reason) = if body.get("tools").is_some() {
        let blocks = json!([
            {"type": "text", "text": "Checking the weather."},
            {"type": "tool_use", "id": "toolu_mock_1", "name": "get_weather", "input": {"location": "Berlin"}},
        ]);
        (blocks, "tool_use")
    } else {
        // Two text blocks so concatenation is observable
        let blocks = json!([
            {"type": "text", "text": "Hello from "},
            {"type": "text", "text": "the mock model"},
        ]);
        (blocks, "end_turn")
    };

    Json(json!({
        "id": "msg_mock_1",
        "type": "message",
        "role": "assistant",
        "model": model,
        "content": content,
        "stop_reason": stop_reason,
        "stop_sequence": null,
        "usage": {"input_tokens": 12, "output_tokens": 6},
    }))
    .into_response()
}

/// SSE body covering the full native event sequence, including a ping and
/// an unrecognized event type that adapters are expected to skip.
fn stream_body(model: &str) -> String {
    let events = [
        (
            "message_start",
            json!({"type": "message_start", "message": {
                "id": "msg_mock_stream",
                "type": "message",
                "role": "assistant",
                "model": model,
                "usage": {"input_tokens": 12, "output_tokens": 0},
            }}),
        ),
        (
            "content_block_start",
            json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
        ),
        ("ping", json!({"type": "ping"})),
        (
            "content_block_delta",
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Hello from "}}),
        ),
        (
            "content_block_checkpoint",
            json!({"type": "content_block_checkpoint", "index": 0}),
        ),
        (
            "content_block_delta",
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "the mock model"}}),
        ),
        ("content_block_stop", json!({"type": "content_block_stop", "index": 0})),
        (
            "message_delta",
            json!({"type": "message_delta", "delta": {"stop_reason": "end_turn", "stop_sequence": null}, "usage": {"output_tokens": 6}}),
        ),
        ("message_stop", json!({"type": "message_stop"})),
    ];

    let mut body = String::new();
    for (event, data) in events {
        body.push_str(&format!("event: {event}\ndata: {data}\n\n"));
    }
    body
}
