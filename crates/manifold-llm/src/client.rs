//! Client facade tying configuration, providers, and catalogs together

use manifold_config::{LlmProviderConfig, LlmProviderType};

use crate::catalog::ModelCatalog;
use crate::error::LlmError;
use crate::provider::anthropic::AnthropicProvider;
use crate::provider::openai::{self, OpenAiProvider};
use crate::provider::{ChunkStream, Provider, ProviderCapabilities};
use crate::types::{
    CompletionRequest, CompletionResponse, EnrichedModelList, ModelList, StandardModelList,
};

/// Default Together AI base URL
const TOGETHER_BASE_URL: &str = "https://api.together.xyz/v1";

/// Default Groq base URL
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Facade over a single configured provider
///
/// Construction selects the adapter for the configured provider kind and
/// wires in the matching built-in enrichment catalog. All calls forward
/// to that one adapter; picking between providers belongs to the caller.
pub struct LlmClient {
    provider: Box<dyn Provider>,
}

impl LlmClient {
    /// Build a client for one configured provider
    pub fn from_config(name: String, config: &LlmProviderConfig) -> Self {
        let provider: Box<dyn Provider> = match config.provider_type {
            LlmProviderType::Openai => Box::new(OpenAiProvider::new(
                name,
                config,
                openai::DEFAULT_BASE_URL,
                ModelCatalog::openai_defaults(),
            )),
            // LocalAI speaks the OpenAI wire protocol; no enrichment data
            // is kept for locally hosted models
            LlmProviderType::LocalAi => Box::new(OpenAiProvider::new(
                name,
                config,
                openai::DEFAULT_BASE_URL,
                ModelCatalog::empty(),
            )),
            LlmProviderType::TogetherAi => Box::new(OpenAiProvider::new(
                name,
                config,
                TOGETHER_BASE_URL,
                ModelCatalog::empty(),
            )),
            LlmProviderType::Groq => Box::new(OpenAiProvider::new(
                name,
                config,
                GROQ_BASE_URL,
                ModelCatalog::empty(),
            )),
            LlmProviderType::Anthropic => Box::new(AnthropicProvider::new(
                name,
                config,
                ModelCatalog::anthropic_defaults(),
            )),
        };

        Self { provider }
    }

    /// Name the provider was configured under
    pub fn name(&self) -> &str {
        self.provider.name()
    }

    /// Capabilities advertised by the underlying provider
    pub fn capabilities(&self) -> ProviderCapabilities {
        self.provider.capabilities()
    }

    /// Send a non-streaming completion request
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        self.provider.complete(request).await
    }

    /// Send a streaming completion request
    pub async fn complete_stream(
        &self,
        request: &CompletionRequest,
    ) -> Result<ChunkStream, LlmError> {
        self.provider.complete_stream(request).await
    }

    /// Fetch the bare model listing
    pub async fn list_models(&self) -> Result<StandardModelList, LlmError> {
        self.provider.list_models().await
    }

    /// Fetch the model listing with enrichment metadata joined in
    pub async fn list_models_enriched(&self) -> Result<EnrichedModelList, LlmError> {
        self.provider.list_models_enriched().await
    }

    /// Fetch the model listing at the width selected by `enrich`
    pub async fn models(&self, enrich: bool) -> Result<ModelList, LlmError> {
        if enrich {
            Ok(ModelList::Enriched(
                self.provider.list_models_enriched().await?,
            ))
        } else {
            Ok(ModelList::Standard(self.provider.list_models().await?))
        }
    }
}
