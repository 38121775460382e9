//! OpenAI-compatible provider implementation

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use manifold_config::LlmProviderConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{ChunkStream, Provider, ProviderCapabilities};
use crate::catalog::{ModelCatalog, merge};
use crate::error::LlmError;
use crate::estimate::{combined_prompt, estimate_usage};
use crate::protocol::openai::{
    OpenAiModelList, OpenAiRequest, OpenAiResponse, OpenAiStreamChunk, OpenAiStreamOptions,
};
use crate::types::{
    CompletionChunk, CompletionRequest, CompletionResponse, EnrichedModelList, StandardModelList,
};

/// Default `OpenAI` API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Whether the provider is the canonical `OpenAI` API (vs a compatible third-party)
fn is_canonical_openai(base_url: &Url) -> bool {
    base_url.host_str().is_some_and(|h| h == "api.openai.com")
}

/// Provider speaking the `OpenAI` chat completions wire protocol
///
/// Also serves LocalAI, Together AI, and Groq, which expose the same
/// protocol under their own base URLs.
pub struct OpenAiProvider {
    name: String,
    client: Client,
    base_url: Url,
    api_key: Option<SecretString>,
    catalog: ModelCatalog,
}

impl OpenAiProvider {
    /// Create from provider configuration
    ///
    /// `default_base_url` is used when the configuration does not pin one;
    /// the enrichment catalog backs the enriched model listing.
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded default base URL is invalid (should never happen).
    pub fn new(
        name: String,
        config: &LlmProviderConfig,
        default_base_url: &str,
        catalog: ModelCatalog,
    ) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| Url::parse(default_base_url).expect("valid default URL"));

        Self {
            name,
            client: Client::new(),
            base_url,
            api_key: config.api_key.clone(),
            catalog,
        }
    }

    /// Build the chat completions URL
    fn completions_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    /// Build the model listing URL
    fn models_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/models")
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
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
        let mut wire_request = OpenAiRequest::from(request);
        // The non-streaming path never sends the streaming flags
        wire_request.stream = None;
        wire_request.stream_options = None;

        let mut builder = self.client.post(self.completions_url()).json(&wire_request);

        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
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

        let wire_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Upstream(format!("failed to parse response: {e}")))?;

        let mut canonical = CompletionResponse::from(wire_response);

        if canonical.usage.is_none() {
            // Some compatible servers never report usage; count locally so
            // non-streaming responses always carry token counts.
            let completion = canonical
                .choices
                .first()
                .and_then(|choice| choice.message.content.as_deref())
                .unwrap_or_default();
            canonical.usage = Some(estimate_usage(&combined_prompt(&request.messages), completion));
        }

        Ok(canonical)
    }

    async fn complete_stream(&self, request: &CompletionRequest) -> Result<ChunkStream, LlmError> {
        let mut wire_request = OpenAiRequest::from(request);
        wire_request.stream = Some(true);

        // stream_options is only sent to canonical OpenAI; many compatible
        // servers (NVIDIA NIM, etc.) reject the unknown parameter
        wire_request.stream_options = if is_canonical_openai(&self.base_url) {
            Some(OpenAiStreamOptions { include_usage: true })
        } else {
            None
        };

        let mut builder = self.client.post(self.completions_url()).json(&wire_request);

        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
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

        let mapped = event_stream
            .take_while(|result| {
                let done = matches!(result, Ok(event) if event.data.trim() == "[DONE]");
                futures_util::future::ready(!done)
            })
            .filter_map(|result| {
                let chunk: Option<Result<CompletionChunk, LlmError>> = match &result {
                    Ok(event) => {
                        let data = event.data.trim();
                        if data.is_empty() {
                            None
                        } else {
                            match serde_json::from_str::<OpenAiStreamChunk>(data) {
                                Ok(wire_chunk) => Some(Ok(wire_chunk.into())),
                                Err(e) => {
                                    tracing::debug!(error = %e, data = %data, "skipping unparseable SSE chunk");
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
        let mut builder = self.client.get(self.models_url());

        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(provider = %self.name, error = %e, "model listing request failed");
            LlmError::Upstream(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Upstream(format!("provider returned {status}: {body}")));
        }

        let wire_list: OpenAiModelList = response
            .json()
            .await
            .map_err(|e| LlmError::Upstream(format!("failed to parse model list: {e}")))?;

        Ok(wire_list.into())
    }

    async fn list_models_enriched(&self) -> Result<EnrichedModelList, LlmError> {
        let listing = self.list_models().await?;
        Ok(merge(&listing, &self.catalog))
    }
}
