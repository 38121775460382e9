#![allow(clippy::must_use_candidate)]

mod env;
pub mod llm;
mod loader;

use serde::Deserialize;

pub use llm::*;

/// Top-level Manifold configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// LLM provider configuration
    #[serde(default)]
    pub llm: LlmConfig,
}
