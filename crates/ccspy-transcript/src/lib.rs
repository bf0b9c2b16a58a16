//! Claude Code session transcripts: reading, paths and token estimates

mod io;
mod paths;
mod reader;
mod tokens;
mod types;

pub use io::{append_line, atomic_write};
pub use paths::{encode_project_path, latest_session, list_sessions, Paths, SessionFile};
pub use reader::{read_conversation, ConversationSource, TranscriptError, TranscriptReader};
pub use tokens::{conversation_tokens, estimate_tokens};
pub use types::{ContentBlock, Message, Role};
