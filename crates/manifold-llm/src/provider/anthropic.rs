//! Anthropic Messages API provider implementation

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use manifold_config::LlmProviderConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{ChunkStream, Provider, ProviderCapabilities};
use crate::catalog::ModelCatalog;
use crate::convert::anthropic::ChunkAssembler;
use crate::error::LlmError;
use crate::protocol::anthropic::{AnthropicRequest, AnthropicResponse, AnthropicStreamEvent};
use crate::types::{
    CompletionChunk, CompletionRequest, CompletionResponse, EnrichedModelList, StandardModelList,
};

/// Default Anthropic API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    name: String,
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    catalog: ModelCatalog,
}

impl AnthropicProvider {
    /// Create from provider configuration
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded default base URL is invalid (should never happen).
    pub fn new(name: String, config: &LlmProviderConfig, catalog: ModelCatalog) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| Url::parse(DEFAULT_BASE_URL).expect("valid default URL"));

        Self {
            name,
            client: Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            catalog,
        }
    }

    /// Build the messages endpoint URL
    fn messages_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/messages")
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            streaming: true,
            tool_calling: true,
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        // Validation lives in the conversion and runs before any network call
        let request = CompletionRequest {
            stream: false,
            ..request.clone()
        };
        let wire_request = AnthropicRequest::try_from(&request)?;

        let mut builder = self
            .client
            .post(self.messages_url())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&wire_request);

        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(provider = %self.name, error = %e, "upstream request failed");
            LlmError::Upstream(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                provider = %self.name,
                status = %status,
                "upstream returned error"
            );
            return Err(LlmError::Upstream(format!("provider returned {status}: {body}")));
        }

        let wire_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Upstream(format!("failed to parse response: {e}")))?;

        Ok(wire_response.into())
    }

    async fn complete_stream(&self, request: &CompletionRequest) -> Result<ChunkStream, LlmError> {
        // Forcing the flag routes the tools-while-streaming rejection and
        // the rest of the validation through the one conversion path
        let request = CompletionRequest {
            stream: true,
            ..request.clone()
        };
        let wire_request = AnthropicRequest::try_from(&request)?;

        let mut builder = self
            .client
            .post(self.messages_url())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&wire_request);

        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(provider = %self.name, error = %e, "upstream stream request failed");
            LlmError::Upstream(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Upstream(format!("provider returned {status}: {body}")));
        }

        let event_stream = response.bytes_stream().eventsource();
        let mut assembler = ChunkAssembler::new(request.model);

        let mapped = event_stream.filter_map(move |result| {
            let chunk: Option<Result<CompletionChunk, LlmError>> = match &result {
                Ok(event) => {
                    let data = event.data.trim();
                    if data.is_empty() {
                        None
                    } else {
                        match serde_json::from_str::<AnthropicStreamEvent>(data) {
                            Ok(stream_event) => assembler.assemble(&stream_event).map(Ok),
                            Err(e) => {
                                tracing::debug!(
                                    error = %e,
                                    "skipping unparseable Anthropic SSE event"
                                );
                                None
                            }
                        }
                    }
                }
                Err(e) => Some(Err(LlmError::Streaming(e.to_string()))),
            };

            async move { chunk }
        });

        Ok(Box::pin(mapped))
    }

    async fn list_models(&self) -> Result<StandardModelList, LlmError> {
        // No listing endpoint upstream; the catalog is the model list
        Ok(self.catalog.standard_list())
    }

    async fn list_models_enriched(&self) -> Result<EnrichedModelList, LlmError> {
        Ok(self.catalog.enriched_list())
    }
}
