//! Canonical types for LLM request/response representation
//!
//! These types are provider-agnostic and serve as the normalized
//! vocabulary that all wire formats convert to and from. The shapes
//! follow the OpenAI chat-completion conventions, which makes the
//! OpenAI-compatible conversions nearly structural and concentrates the
//! real translation work in the Anthropic adapter.

pub mod message;
pub mod model;
pub mod request;
pub mod response;
pub mod stream;
pub mod tool;

pub use message::{FunctionCall, Message, Role, ToolCall};
pub use model::{
    EnrichedModel, EnrichedModelList, Model, ModelCapabilities, ModelList, ModelPrices, StandardModelList,
};
pub use request::{CompletionParams, CompletionRequest};
pub use response::{Choice, ChoiceMessage, CompletionResponse, FinishReason, Usage};
pub use stream::{ChunkChoice, ChunkDelta, ChunkFunctionCall, ChunkToolCall, CompletionChunk};
pub use tool::{
    FunctionDefinition, ToolChoice, ToolChoiceFunction, ToolChoiceFunctionName, ToolChoiceMode, ToolDefinition,
};
