//! Conversion between canonical types and the Anthropic Messages wire format
//!
//! This is where the real translation work lives: system prompts move to a
//! side-channel field, roles Anthropic does not accept are filtered, tool
//! schemas are re-rooted, and the event stream is reassembled into canonical
//! chunks.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::LlmError;
use crate::protocol::anthropic::{
    AnthropicMessage, AnthropicRequest, AnthropicResponse, AnthropicResponseBlock, AnthropicStreamDelta,
    AnthropicStreamEvent, AnthropicTool, AnthropicToolChoice,
};
use crate::types::{
    Choice, ChoiceMessage, ChunkChoice, ChunkDelta, CompletionChunk, CompletionRequest, CompletionResponse,
    FinishReason, Message, Role, ToolCall, ToolChoice, ToolChoiceMode, ToolDefinition, Usage,
};

/// Max tokens sent when the caller does not specify a positive value
///
/// The field is required by the Messages API, so a default has to exist.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Largest `max_tokens` value forwarded upstream
pub const MAX_TOKENS_CEILING: u32 = 4096;

// -- Request conversion: canonical -> Anthropic --

impl TryFrom<&CompletionRequest> for AnthropicRequest {
    type Error = LlmError;

    fn try_from(req: &CompletionRequest) -> Result<Self, Self::Error> {
        if req.stream && req.tools.as_ref().is_some_and(|tools| !tools.is_empty()) {
            return Err(LlmError::UnsupportedCapability(
                "Anthropic does not support tool calling on streaming requests".to_owned(),
            ));
        }

        let temperature = validate_temperature(req.params.temperature)?;

        // Only the first system message feeds the side-channel field; later
        // ones are dropped rather than merged.
        let system = req
            .messages
            .iter()
            .find(|msg| msg.role == Role::System)
            .and_then(|msg| msg.content.clone());

        let messages = req
            .messages
            .iter()
            .filter(|msg| matches!(msg.role, Role::User | Role::Assistant))
            .map(message_to_anthropic)
            .collect();

        let tools = req
            .tools
            .as_ref()
            .map(|tools| tools.iter().map(tool_to_anthropic).collect());

        Ok(Self {
            model: req.model.clone(),
            max_tokens: clamp_max_tokens(req.params.max_tokens),
            system,
            messages,
            temperature,
            top_p: req.params.top_p,
            stop_sequences: req.params.stop.clone(),
            stream: req.stream.then_some(true),
            tools,
            tool_choice: req.tool_choice.as_ref().map(tool_choice_to_anthropic),
        })
    }
}

/// Convert a canonical message to Anthropic wire format
///
/// Only called for user/assistant roles; null content coerces to an empty
/// string because the Messages API rejects null.
fn message_to_anthropic(msg: &Message) -> AnthropicMessage {
    let role = match msg.role {
        Role::Assistant => "assistant",
        _ => "user",
    };

    AnthropicMessage {
        role: role.to_owned(),
        content: msg.content.clone().unwrap_or_default(),
    }
}

/// Resolve the required `max_tokens` field from an optional canonical value
fn clamp_max_tokens(requested: Option<u32>) -> u32 {
    match requested {
        None | Some(0) => DEFAULT_MAX_TOKENS,
        Some(value) if value > MAX_TOKENS_CEILING => {
            tracing::warn!(
                requested = value,
                capped = MAX_TOKENS_CEILING,
                "max_tokens exceeds the Anthropic ceiling, capping"
            );
            MAX_TOKENS_CEILING
        }
        Some(value) => value,
    }
}

/// Reject temperatures outside the range the Messages API enforces
fn validate_temperature(temperature: Option<f64>) -> Result<Option<f64>, LlmError> {
    match temperature {
        Some(value) if !(0.0..=1.0).contains(&value) => Err(LlmError::InvalidRequest(format!(
            "temperature must be between 0 and 1, got {value}"
        ))),
        other => Ok(other),
    }
}

/// Convert a canonical tool definition to Anthropic wire format
///
/// The JSON-schema `properties` and `required` keys carry over when present;
/// absent keys are dropped from the schema rather than emitted as null.
fn tool_to_anthropic(tool: &ToolDefinition) -> AnthropicTool {
    let mut schema = serde_json::Map::new();
    schema.insert("type".to_owned(), serde_json::Value::String("object".to_owned()));

    if let Some(parameters) = &tool.function.parameters {
        if let Some(properties) = parameters.get("properties").filter(|v| !v.is_null()) {
            schema.insert("properties".to_owned(), properties.clone());
        }
        if let Some(required) = parameters.get("required").filter(|v| !v.is_null()) {
            schema.insert("required".to_owned(), required.clone());
        }
    }

    AnthropicTool {
        name: tool.function.name.clone(),
        description: tool.function.description.clone(),
        input_schema: serde_json::Value::Object(schema),
    }
}

/// Convert a canonical tool choice to Anthropic wire format
fn tool_choice_to_anthropic(choice: &ToolChoice) -> AnthropicToolChoice {
    match choice {
        ToolChoice::Mode(mode) => match mode {
            // Anthropic has no "none" mode; map both None and Auto to "auto"
            ToolChoiceMode::None | ToolChoiceMode::Auto => AnthropicToolChoice {
                choice_type: "auto".to_owned(),
                name: None,
            },
            ToolChoiceMode::Required => AnthropicToolChoice {
                choice_type: "any".to_owned(),
                name: None,
            },
        },
        ToolChoice::Function(func) => AnthropicToolChoice {
            choice_type: "tool".to_owned(),
            name: Some(func.function.name.clone()),
        },
    }
}

// -- Finish reason mapping --

/// Map a non-streaming stop reason to the canonical finish reason
///
/// Unrecognized or absent reasons default to `Stop`: a complete response has
/// terminated by definition.
pub fn map_stop_reason(stop_reason: Option<&str>) -> FinishReason {
    match stop_reason {
        Some("max_tokens") => FinishReason::Length,
        Some("tool_use") => FinishReason::ToolCalls,
        _ => FinishReason::Stop,
    }
}

/// Map a streaming stop reason to the canonical finish reason
///
/// Unrecognized or absent reasons map to `None` here, not `Stop`: a
/// mid-stream chunk must never claim termination.
pub fn map_stream_stop_reason(stop_reason: Option<&str>) -> Option<FinishReason> {
    match stop_reason {
        Some("max_tokens") => Some(FinishReason::Length),
        Some("end_turn") => Some(FinishReason::Stop),
        _ => None,
    }
}

// -- Response conversion: Anthropic -> canonical --

impl From<AnthropicResponse> for CompletionResponse {
    fn from(resp: AnthropicResponse) -> Self {
        let mut text_content = String::new();
        let mut tool_calls = Vec::new();

        for block in &resp.content {
            match block {
                AnthropicResponseBlock::Text { text } => {
                    text_content.push_str(text);
                }
                AnthropicResponseBlock::ToolUse { id, name, input } => {
                    let arguments = serde_json::to_string(input).unwrap_or_else(|_| "{}".to_owned());
                    tool_calls.push(ToolCall::function(id.clone(), name.clone(), arguments));
                }
            }
        }

        let finish_reason = Some(map_stop_reason(resp.stop_reason.as_deref()));

        // Content and tool calls are mutually exclusive in the canonical
        // message; any tool use wins.
        let message = if tool_calls.is_empty() {
            ChoiceMessage::text(text_content)
        } else {
            ChoiceMessage::with_tool_calls(tool_calls)
        };

        Self {
            id: resp.id,
            object: "chat.completion".to_owned(),
            created: unix_timestamp(),
            model: resp.model,
            choices: vec![Choice {
                index: 0,
                message,
                finish_reason,
            }],
            usage: Some(Usage::from_parts(resp.usage.input_tokens, resp.usage.output_tokens)),
        }
    }
}

/// Current Unix timestamp in seconds
fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// -- Stream conversion --

/// Assembles canonical chunks from the Anthropic event stream
///
/// Carries the session state a single event cannot supply on its own: the
/// message id (only present on `message_start`), the model, the creation
/// timestamp, and the prompt token count for the terminal usage object.
#[derive(Debug)]
pub struct ChunkAssembler {
    model: String,
    created: u64,
    message_id: String,
    prompt_tokens: u32,
}

impl ChunkAssembler {
    /// Create an assembler for one streaming session
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            created: unix_timestamp(),
            // Placeholder until message_start arrives; a well-formed stream
            // replaces it before any content chunk is emitted.
            message_id: String::new(),
            prompt_tokens: 0,
        }
    }

    /// Convert one native event into at most one canonical chunk
    ///
    /// Only `message_start`, `content_block_delta`, and `message_delta`
    /// produce chunks. Everything else, including event types added to the
    /// protocol after this was written, is skipped.
    pub fn assemble(&mut self, event: &AnthropicStreamEvent) -> Option<CompletionChunk> {
        match event {
            AnthropicStreamEvent::MessageStart { message } => {
                self.message_id = message.id.clone();
                if let Some(usage) = &message.usage {
                    self.prompt_tokens = usage.input_tokens;
                }
                let delta = ChunkDelta {
                    role: Some("assistant".to_owned()),
                    content: Some(String::new()),
                    tool_calls: None,
                };
                Some(self.chunk(delta, None, None))
            }

            AnthropicStreamEvent::ContentBlockDelta { delta, .. } => {
                let text = match delta {
                    AnthropicStreamDelta::TextDelta { text } => text.clone(),
                    // Non-text deltas keep the chunk cadence with empty content
                    AnthropicStreamDelta::InputJsonDelta { .. } => String::new(),
                };
                let delta = ChunkDelta {
                    role: None,
                    content: Some(text),
                    tool_calls: None,
                };
                Some(self.chunk(delta, None, None))
            }

            AnthropicStreamEvent::MessageDelta { delta, usage } => {
                let finish_reason = map_stream_stop_reason(delta.stop_reason.as_deref());
                let usage = usage
                    .as_ref()
                    .map(|u| Usage::from_parts(self.prompt_tokens, u.output_tokens));
                Some(self.chunk(ChunkDelta::default(), finish_reason, usage))
            }

            AnthropicStreamEvent::ContentBlockStart { .. }
            | AnthropicStreamEvent::ContentBlockStop { .. }
            | AnthropicStreamEvent::MessageStop
            | AnthropicStreamEvent::Ping => None,
        }
    }

    /// Wrap a delta in the canonical chunk envelope for this session
    fn chunk(&self, delta: ChunkDelta, finish_reason: Option<FinishReason>, usage: Option<Usage>) -> CompletionChunk {
        CompletionChunk {
            id: self.message_id.clone(),
            object: "chat.completion.chunk".to_owned(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason,
            }],
            usage,
        }
    }
}
