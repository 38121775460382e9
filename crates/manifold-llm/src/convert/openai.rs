//! Conversion between canonical types and the `OpenAI` wire format
//!
//! The canonical shapes follow `OpenAI` conventions, so these conversions
//! are mostly structural. The wire usage total is still recomputed rather
//! than trusted.

use crate::protocol::openai::{
    OpenAiFunction, OpenAiMessage, OpenAiModel, OpenAiModelList, OpenAiRequest, OpenAiResponse, OpenAiStreamChunk,
    OpenAiStreamOptions, OpenAiTool,
};
use crate::types::{
    Choice, ChoiceMessage, ChunkChoice, ChunkDelta, ChunkFunctionCall, ChunkToolCall, CompletionChunk,
    CompletionRequest, CompletionResponse, FinishReason, Message, Model, Role, StandardModelList, ToolCall, ToolChoice,
    ToolChoiceMode, Usage,
};

// -- Request conversion: canonical -> OpenAI --

impl From<&CompletionRequest> for OpenAiRequest {
    fn from(req: &CompletionRequest) -> Self {
        Self {
            model: req.model.clone(),
            messages: req.messages.iter().map(Into::into).collect(),
            temperature: req.params.temperature,
            top_p: req.params.top_p,
            max_tokens: req.params.max_tokens,
            stop: req.params.stop.clone(),
            frequency_penalty: req.params.frequency_penalty,
            presence_penalty: req.params.presence_penalty,
            seed: req.params.seed,
            stream: req.stream.then_some(true),
            tools: req.tools.as_ref().map(|tools| {
                tools
                    .iter()
                    .map(|t| OpenAiTool {
                        tool_type: t.tool_type.clone(),
                        function: OpenAiFunction {
                            name: t.function.name.clone(),
                            description: t.function.description.clone(),
                            parameters: t.function.parameters.clone(),
                        },
                    })
                    .collect()
            }),
            tool_choice: req.tool_choice.as_ref().map(tool_choice_to_openai_value),
            // The provider clears this for compatible servers that reject it
            stream_options: req.stream.then_some(OpenAiStreamOptions { include_usage: true }),
        }
    }
}

impl From<&Message> for OpenAiMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Function => "function",
        };

        Self {
            role: role.to_owned(),
            content: msg.content.clone(),
        }
    }
}

/// Convert a canonical tool choice to the `OpenAI` JSON value
fn tool_choice_to_openai_value(choice: &ToolChoice) -> serde_json::Value {
    match choice {
        ToolChoice::Mode(mode) => {
            let s = match mode {
                ToolChoiceMode::None => "none",
                ToolChoiceMode::Auto => "auto",
                ToolChoiceMode::Required => "required",
            };
            serde_json::Value::String(s.to_owned())
        }
        ToolChoice::Function(func) => {
            serde_json::json!({
                "type": func.tool_type,
                "function": {
                    "name": func.function.name
                }
            })
        }
    }
}

// -- Response conversion: OpenAI -> canonical --

impl From<OpenAiResponse> for CompletionResponse {
    fn from(resp: OpenAiResponse) -> Self {
        Self {
            id: resp.id,
            object: resp.object,
            created: resp.created,
            model: resp.model,
            choices: resp
                .choices
                .into_iter()
                .map(|c| {
                    let finish_reason = c.finish_reason.as_deref().and_then(parse_finish_reason);

                    let tool_calls = c.message.tool_calls.map(|calls| {
                        calls
                            .into_iter()
                            .map(|tc| ToolCall::function(tc.id, tc.function.name, tc.function.arguments))
                            .collect()
                    });

                    Choice {
                        index: c.index,
                        message: ChoiceMessage {
                            role: c.message.role,
                            content: c.message.content,
                            tool_calls,
                        },
                        finish_reason,
                    }
                })
                .collect(),
            // Recomputed from the parts; upstream totals are not trusted
            usage: resp.usage.map(|u| Usage::from_parts(u.prompt_tokens, u.completion_tokens)),
        }
    }
}

/// Parse a finish reason string
///
/// Accepts both the `OpenAI` vocabulary and the Anthropic one, since
/// compatible servers sometimes proxy the latter through.
pub fn parse_finish_reason(s: &str) -> Option<FinishReason> {
    match s {
        "stop" | "end_turn" => Some(FinishReason::Stop),
        "length" | "max_tokens" => Some(FinishReason::Length),
        "tool_calls" | "tool_use" => Some(FinishReason::ToolCalls),
        "content_filter" => Some(FinishReason::ContentFilter),
        _ => None,
    }
}

// -- Stream conversion --

impl From<OpenAiStreamChunk> for CompletionChunk {
    fn from(chunk: OpenAiStreamChunk) -> Self {
        Self {
            id: chunk.id,
            object: chunk.object,
            created: chunk.created,
            model: chunk.model,
            choices: chunk
                .choices
                .into_iter()
                .map(|c| ChunkChoice {
                    index: c.index,
                    delta: ChunkDelta {
                        role: c.delta.role,
                        content: c.delta.content,
                        tool_calls: c.delta.tool_calls.map(|calls| {
                            calls
                                .into_iter()
                                .map(|tc| ChunkToolCall {
                                    index: tc.index,
                                    id: tc.id,
                                    call_type: tc.tool_type,
                                    function: tc.function.map(|f| ChunkFunctionCall {
                                        name: f.name,
                                        arguments: f.arguments,
                                    }),
                                })
                                .collect()
                        }),
                    },
                    finish_reason: c.finish_reason.as_deref().and_then(parse_finish_reason),
                })
                .collect(),
            usage: chunk.usage.map(|u| Usage::from_parts(u.prompt_tokens, u.completion_tokens)),
        }
    }
}

// -- Model list conversion --

impl From<OpenAiModel> for Model {
    fn from(model: OpenAiModel) -> Self {
        Self {
            id: model.id,
            object: model.object,
            created: model.created,
            owned_by: model.owned_by,
        }
    }
}

impl From<OpenAiModelList> for StandardModelList {
    fn from(list: OpenAiModelList) -> Self {
        Self {
            object: list.object,
            data: list.data.into_iter().map(Into::into).collect(),
        }
    }
}
