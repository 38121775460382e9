//! Streaming completion round trips against mock backends

mod harness;

use futures_util::StreamExt;
use harness::config::provider_config;
use harness::mock_anthropic::MockAnthropic;
use harness::mock_openai::MockOpenAi;
use manifold_config::LlmProviderType;
use manifold_llm::types::{FinishReason, Message};
use manifold_llm::{CompletionChunk, CompletionRequest, LlmClient};

fn stream_request(model: &str) -> CompletionRequest {
    let mut request = CompletionRequest::new(model, vec![Message::user("Hi")]);
    request.stream = true;
    request
}

async fn collect_chunks(client: &LlmClient, request: &CompletionRequest) -> Vec<CompletionChunk> {
    let mut stream = client.complete_stream(request).await.unwrap();
    let mut chunks = Vec::new();
    while let Some(item) = stream.next().await {
        chunks.push(item.unwrap());
    }
    chunks
}

fn collected_content(chunks: &[CompletionChunk]) -> String {
    chunks
        .iter()
        .filter_map(|chunk| chunk.choices.first().and_then(|choice| choice.delta.content.as_deref()))
        .collect()
}

#[tokio::test]
async fn openai_stream_reconstructs_the_content() {
    let mock = MockOpenAi::start().await.unwrap();
    let config = provider_config(LlmProviderType::Openai, &mock.base_url());
    let client = LlmClient::from_config("mock".to_owned(), &config);

    let chunks = collect_chunks(&client, &stream_request("mock-model-1")).await;

    assert!(!chunks.is_empty());
    assert_eq!(collected_content(&chunks).trim_end(), "Hello from the mock model");

    let finish = chunks
        .iter()
        .find_map(|chunk| chunk.choices.first().and_then(|choice| choice.finish_reason));
    assert_eq!(finish, Some(FinishReason::Stop));
}

#[tokio::test]
async fn openai_stream_chunks_share_one_session_identity() {
    let mock = MockOpenAi::start().await.unwrap();
    let config = provider_config(LlmProviderType::Openai, &mock.base_url());
    let client = LlmClient::from_config("mock".to_owned(), &config);

    let chunks = collect_chunks(&client, &stream_request("mock-model-1")).await;

    assert!(chunks.iter().all(|chunk| chunk.id == chunks[0].id));
    assert!(chunks.iter().all(|chunk| chunk.model == "mock-model-1"));
    assert!(chunks.iter().all(|chunk| chunk.object == "chat.completion.chunk"));
}

#[tokio::test]
async fn openai_stream_usage_arrives_on_the_final_chunk() {
    let mock = MockOpenAi::start().await.unwrap();
    let config = provider_config(LlmProviderType::Openai, &mock.base_url());
    let client = LlmClient::from_config("mock".to_owned(), &config);

    let chunks = collect_chunks(&client, &stream_request("mock-model-1")).await;

    let last = chunks.last().expect("stream should yield chunks");
    let usage = last.usage.as_ref().expect("final chunk should carry usage");
    assert_eq!(usage.prompt_tokens, 10);
    assert_eq!(usage.completion_tokens, 5);
    assert_eq!(usage.total_tokens, 15);
    // Earlier chunks carry no usage
    assert!(chunks[..chunks.len() - 1].iter().all(|chunk| chunk.usage.is_none()));
}

#[tokio::test]
async fn stream_options_are_not_sent_to_compatible_servers() {
    let mock = MockOpenAi::start().await.unwrap();
    let config = provider_config(LlmProviderType::Openai, &mock.base_url());
    let client = LlmClient::from_config("mock".to_owned(), &config);

    collect_chunks(&client, &stream_request("mock-model-1")).await;

    let captured = mock.captured().expect("mock should have seen a request");
    assert_eq!(captured.body["stream"], true);
    assert!(captured.body.get("stream_options").is_none());
}

#[tokio::test]
async fn anthropic_stream_adapts_native_events() {
    let mock = MockAnthropic::start().await.unwrap();
    let config = provider_config(LlmProviderType::Anthropic, &mock.base_url());
    let client = LlmClient::from_config("claude".to_owned(), &config);

    let chunks = collect_chunks(&client, &stream_request("claude-3-haiku-20240307")).await;

    // message_start, two text deltas, and the terminal message_delta produce
    // chunks; pings, block bookkeeping, and unrecognized event types do not.
    assert_eq!(chunks.len(), 4);
    assert!(chunks.iter().all(|chunk| chunk.id == "msg_mock_stream"));
    assert!(chunks.iter().all(|chunk| chunk.model == "claude-3-haiku-20240307"));

    let first = &chunks[0].choices[0];
    assert_eq!(first.delta.role.as_deref(), Some("assistant"));
    assert_eq!(first.delta.content.as_deref(), Some(""));

    assert_eq!(collected_content(&chunks), "Hello from the mock model");

    let last = &chunks[3];
    assert_eq!(last.choices[0].finish_reason, Some(FinishReason::Stop));
    let usage = last.usage.as_ref().expect("terminal chunk should carry usage");
    assert_eq!(usage.prompt_tokens, 12);
    assert_eq!(usage.completion_tokens, 6);
    assert_eq!(usage.total_tokens, 18);
}

#[tokio::test]
async fn anthropic_stream_request_carries_the_flag() {
    let mock = MockAnthropic::start().await.unwrap();
    let config = provider_config(LlmProviderType::Anthropic, &mock.base_url());
    let client = LlmClient::from_config("claude".to_owned(), &config);

    collect_chunks(&client, &stream_request("claude-3-haiku-20240307")).await;

    let captured = mock.captured().expect("mock should have seen a request");
    assert_eq!(captured.body["stream"], true);
    assert_eq!(captured.body["max_tokens"], 1024);
}
