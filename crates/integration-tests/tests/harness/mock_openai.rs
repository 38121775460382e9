//! Mock OpenAI-compatible backend
//!
//! Serves canned chat completions, SSE streams, and a model listing, and
//! captures the most recent request so tests can assert on the wire shape.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

const DEFAULT_CONTENT: &str = "Hello from the mock model";

/// What the mock saw in the most recent completion request
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Raw JSON request body
    pub body: Value,
    /// Token from the Authorization header, if any
    pub bearer_token: Option<String>,
}

struct MockState {
    completion_count: AtomicU32,
    with_usage: bool,
    failing: bool,
    content: String,
    captured: Mutex<Option<CapturedRequest>>,
}

/// In-process server speaking the OpenAI chat completion protocol
pub struct MockOpenAi {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

impl MockOpenAi {
    /// Start a mock with the default canned response
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(true, false, DEFAULT_CONTENT).await
    }

    /// Start a mock whose responses never carry a usage object
    pub async fn start_without_usage() -> anyhow::Result<Self> {
        Self::start_inner(false, false, DEFAULT_CONTENT).await
    }

    /// Start a mock that answers with the given text
    pub async fn start_with_response(content: &str) -> anyhow::Result<Self> {
        Self::start_inner(true, false, content).await
    }

    /// Start a mock that rejects every completion with a 500
    pub async fn start_failing() -> anyhow::Result<Self> {
        Self::start_inner(true, true, DEFAULT_CONTENT).await
    }

    async fn start_inner(with_usage: bool, failing: bool, content: &str) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            completion_count: AtomicU32::new(0),
            with_usage,
            failing,
            content: content.to_owned(),
            captured: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/chat/completions", routing::post(handle_completions))
            .route("/v1/models", routing::get(handle_models))
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

    /// Number of completion requests received
    pub fn completion_count(&self) -> u32 {
        self.state.completion_count.load(Ordering::Relaxed)
    }

    /// The most recent completion request, if one arrived
    pub fn captured(&self) -> Option<CapturedRequest> {
        self.state.captured.lock().unwrap().clone()
    }
}

impl Drop for MockOpenAi {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_completions(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.completion_count.fetch_add(1, Ordering::Relaxed);

    let bearer_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);
    *state.captured.lock().unwrap() = Some(CapturedRequest { body: body.clone(), bearer_token });

    if state.failing {
        let error = json!({"error": {"message": "mock failure", "type": "server_error"}});
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response();
    }

    let model = body["model"].as_str().unwrap_or("mock-model").to_owned();

    if body["stream"].as_bool().unwrap_or(false) {
        return sse_response(stream_body(&model, &state.content, state.with_usage));
    }

    let (content, tool_calls, finish_reason) = if body.get("tools").is_some() {
        let calls = json!([{
            "id": "call_mock_1",
            "type": "function",
            "function": {"name": "get_weather", "arguments": "{\"location\":\"Berlin\"}"},
        }]);
        (Value::Null, calls, "tool_calls")
    } else {
        (json!(state.content), Value::Null, "stop")
    };

    let mut response = json!({
        "id": "chatcmpl-mock-1",
        "object": "chat.completion",
        "created": 1_700_000_000u64,
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content, "tool_calls": tool_calls},
            "finish_reason": finish_reason,
        }],
    });
    if state.with_usage {
        response["usage"] = json!({"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15});
    }

    Json(response).into_response()
}

async fn handle_models() -> Json<Value> {
    Json(json!({
        "object": "list",
        "data": [
            {"id": "gpt-4", "object": "model", "created": 1_687_882_411u64, "owned_by": "openai"},
            {"id": "mock-model-1", "object": "model", "created": 1_700_000_000u64, "owned_by": "mock"},
        ],
    }))
}

fn sse_response(body: String) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

fn stream_body(model: &str, content: &str, with_usage: bool) -> String {
    let mut chunks = vec![delta_chunk(model, json!({"role": "assistant", "content": ""}), None)];
    for word in content.split_whitespace() {
        chunks.push(delta_chunk(model, json!({"content": format!("{word} ")}), None));
    }
    chunks.push(delta_chunk(model, json!({}), Some("stop")));

    if with_usage {
        chunks.push(json!({
            "id": "chatcmpl-mock-stream",
            "object": "chat.completion.chunk",
            "created": 1_700_000_000u64,
            "model": model,
            "choices": [],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15},
        }));
    }

    let mut body = String::new();
    for chunk in chunks {
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn delta_chunk(model: &str, delta: Value, finish_reason: Option<&str>) -> Value {
    json!({
        "id": "chatcmpl-mock-stream",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000u64,
        "model": model,
        "choices": [{"index": 0, "delta": delta, "finish_reason": finish_reason}],
    })
}
