//! Provider trait and implementations for LLM backends

pub mod anthropic;
pub mod openai;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::error::LlmError;
use crate::types::{
    CompletionChunk, CompletionRequest, CompletionResponse, EnrichedModelList, StandardModelList,
};

/// Stream of canonical completion chunks
///
/// Chunks arrive in upstream event order. Dropping the stream tears down
/// the underlying connection.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<CompletionChunk, LlmError>> + Send>>;

/// Capabilities advertised by a provider
#[derive(Debug, Clone)]
pub struct ProviderCapabilities {
    /// Whether the provider supports streaming responses
    pub streaming: bool,
    /// Whether the provider supports tool/function calling
    pub tool_calling: bool,
}

/// Trait implemented by each LLM provider backend
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Advertised capabilities
    fn capabilities(&self) -> ProviderCapabilities;

    /// Send a non-streaming completion request
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Send a streaming completion request
    async fn complete_stream(&self, request: &CompletionRequest) -> Result<ChunkStream, LlmError>;

    /// Fetch the bare model listing
    async fn list_models(&self) -> Result<StandardModelList, LlmError>;

    /// Fetch the model listing with enrichment metadata joined in
    async fn list_models_enriched(&self) -> Result<EnrichedModelList, LlmError>;
}
