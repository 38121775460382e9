//! Local token usage estimation
//!
//! Not every OpenAI-compatible server reports token usage, so responses
//! arriving without it get an estimate counted locally against the
//! cl100k encoding.

use tiktoken_rs::cl100k_base;

use crate::types::{Message, Usage};

/// Estimate the token count of a piece of text
///
/// Falls back to a four-bytes-per-token heuristic when the encoder
/// cannot be constructed.
#[allow(clippy::cast_possible_truncation)]
pub fn estimate_tokens(text: &str) -> u32 {
    let count = cl100k_base().map_or_else(
        |_| text.len() / 4,
        |bpe| bpe.encode_with_special_tokens(text).len(),
    );
    count as u32
}

/// Build a usage record by counting prompt and completion text locally
pub fn estimate_usage(prompt: &str, completion: &str) -> Usage {
    Usage::from_parts(estimate_tokens(prompt), estimate_tokens(completion))
}

/// Flatten a message sequence into a single prompt string for counting
///
/// Messages with null content contribute nothing.
pub fn combined_prompt(messages: &[Message]) -> String {
    messages
        .iter()
        .filter_map(|message| message.content.as_deref())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn empty_text_counts_zero_tokens() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn short_phrases_count_a_handful_of_tokens() {
        assert_eq!(estimate_tokens("hello world"), 2);
    }

    #[test]
    fn usage_total_is_the_sum_of_the_parts() {
        let usage = estimate_usage(
            "What is the capital of France?",
            "Paris is the capital of France.",
        );

        assert_eq!(
            usage.total_tokens,
            usage.prompt_tokens + usage.completion_tokens
        );
        assert!(usage.prompt_tokens > 0);
        assert!(usage.completion_tokens > 0);
    }

    #[test]
    fn combined_prompt_joins_content_and_skips_null() {
        let messages = vec![
            Message::system("Be terse"),
            Message::user("Hi"),
            Message {
                role: Role::Assistant,
                content: None,
            },
        ];

        assert_eq!(combined_prompt(&messages), "Be terse\nHi");
    }
}
