//! Provider configuration helpers

use manifold_config::{LlmProviderConfig, LlmProviderType};
use secrecy::SecretString;

/// Provider config pointed at a mock backend
pub fn provider_config(provider_type: LlmProviderType, base_url: &str) -> LlmProviderConfig {
    LlmProviderConfig {
        provider_type,
        api_key: Some(SecretString::from("test-key")),
        base_url: Some(base_url.parse().expect("valid URL")),
    }
}

/// Provider config without credentials
pub fn keyless_config(provider_type: LlmProviderType, base_url: &str) -> LlmProviderConfig {
    LlmProviderConfig {
        provider_type,
        api_key: None,
        base_url: Some(base_url.parse().expect("valid URL")),
    }
}
