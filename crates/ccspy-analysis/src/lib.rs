//! Conversation analysis through an external LLM

mod client;
mod error;
mod interactions;
mod prompt;
mod types;

pub use client::{
    Analyzer, ChatClient, ClientConfig, DEFAULT_API_KEY_VAR, DEFAULT_ENDPOINT, DEFAULT_MODEL,
    DEFAULT_TIMEOUT, NANO_MODEL,
};
pub use error::AnalysisError;
pub use interactions::extract_interactions;
pub use prompt::{build_user_message, format_interactions, system_prompt};
pub use types::{AnalysisKind, AnalysisResult, Interaction, ToolCall};
