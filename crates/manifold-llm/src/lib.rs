//! Provider adapter layer for Manifold
//!
//! Translates a canonical, `OpenAI`-flavored chat completion vocabulary to
//! and from the wire formats of the supported providers (`OpenAI` and
//! compatible servers, Anthropic), adapts their streaming events to one
//! chunk shape, and joins model listings with built-in enrichment metadata.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod catalog;
pub mod client;
pub mod convert;
pub mod error;
pub mod estimate;
pub mod protocol;
pub mod provider;
pub mod types;

pub use catalog::ModelCatalog;
pub use client::LlmClient;
pub use error::LlmError;
pub use provider::{ChunkStream, Provider, ProviderCapabilities};
pub use types::{CompletionChunk, CompletionRequest, CompletionResponse, ModelList};
