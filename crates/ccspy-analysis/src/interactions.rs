//! Reduce a conversation to user/assistant interactions

use crate::types::{Interaction, ToolCall};
use ccspy_transcript::{Message, Role};

/// Group messages into interactions and keep the last `limit`
///
/// Each non-tool-result user message opens an interaction. Tool-result turns
/// never open one, so a tool round trip stays inside the interaction that
/// requested it. Assistant messages before the first user message open an
/// interaction with empty user text, so a window that starts mid-reply still
/// covers those replies.
pub fn extract_interactions(messages: &[Message], limit: usize) -> Vec<Interaction> {
    let mut interactions = Vec::new();
    let mut current: Option<Interaction> = None;

    for message in messages {
        match message.role {
            Role::User => {
                if message.is_tool_result() {
                    continue;
                }
                if let Some(done) = current.take() {
                    interactions.push(done);
                }
                current = Some(Interaction {
                    user: message.first_text().unwrap_or_default().to_string(),
                    ..Default::default()
                });
            }
            Role::Assistant => {
                let interaction = current.get_or_insert_with(Interaction::default);
                for text in message.texts() {
                    interaction.assistant.push_str(text);
                    interaction.assistant.push('\n');
                }
                interaction
                    .tools
                    .extend(message.tool_uses().map(|(name, input)| ToolCall {
                        name: name.to_string(),
                        input: input.clone(),
                    }));
            }
        }
    }

    if let Some(done) = current {
        interactions.push(done);
    }

    let skip = interactions.len().saturating_sub(limit);
    interactions.split_off(skip)
}
