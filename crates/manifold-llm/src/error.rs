use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// Request violates a translator precondition for the target provider
    ///
    /// Raised before any network call, e.g. a temperature outside the range
    /// the provider enforces.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Requested combination is one the provider cannot express
    ///
    /// Raised before any network call, e.g. tool calling on a streaming
    /// request against a provider that forbids the pairing.
    #[error("unsupported capability: {0}")]
    UnsupportedCapability(String),

    /// Upstream provider returned an error
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Error during streaming response
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LlmError {
    /// Whether callers may reasonably retry the operation
    ///
    /// Advisory only. No retries happen inside this layer; outer layers can
    /// use this to distinguish transient provider trouble from requests that
    /// will never succeed as written.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::Streaming(_) | Self::Internal(_))
    }
}
