//! Token estimation utilities

use crate::types::{Message, Role};

const CHARS_PER_TOKEN: usize = 4;

/// Estimate token count from text
///
/// Character-count heuristic (~4 chars/token, rounded up). Not a tokenizer.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Estimated tokens across all assistant text blocks
///
/// Each text block is rounded up on its own, so two short blocks count as
/// two tokens rather than one.
pub fn conversation_tokens(messages: &[Message]) -> usize {
    messages
        .iter()
        .filter(|m| m.role == Role::Assistant)
        .flat_map(|m| m.texts())
        .map(estimate_tokens)
        .sum()
}
