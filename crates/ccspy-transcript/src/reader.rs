//! Incremental transcript reading

use crate::types::Message;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("failed to read transcript {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Anything that can produce the current conversation of a session
pub trait ConversationSource: Send {
    /// Full conversation as of now, in file order
    fn read(&mut self) -> Result<Vec<Message>, TranscriptError>;
}

/// Tails a session JSONL file by byte offset
///
/// Complete lines are parsed once and cached. A trailing line with no
/// newline yet is parsed on every read but never cached, since the writer
/// may still be appending to it. If the file shrinks below the consumed
/// offset it is re-read from the start.
#[derive(Debug)]
pub struct TranscriptReader {
    path: PathBuf,
    offset: u64,
    messages: Vec<Message>,
}

impl TranscriptReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
            messages: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> TranscriptError {
        TranscriptError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ConversationSource for TranscriptReader {
    fn read(&mut self) -> Result<Vec<Message>, TranscriptError> {
        let mut file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        let len = file.metadata().map_err(|e| self.io_error(e))?.len();

        if len < self.offset {
            self.offset = 0;
            self.messages.clear();
        }

        file.seek(SeekFrom::Start(self.offset))
            .map_err(|e| self.io_error(e))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).map_err(|e| self.io_error(e))?;

        let complete = buf
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);

        self.messages
            .extend(buf[..complete].split(|&b| b == b'\n').filter_map(parse_line));
        self.offset += complete as u64;

        let mut conversation = self.messages.clone();
        if let Some(partial) = parse_line(&buf[complete..]) {
            conversation.push(partial);
        }
        Ok(conversation)
    }
}

fn parse_line(line: &[u8]) -> Option<Message> {
    let text = std::str::from_utf8(line).ok()?.trim();
    if text.is_empty() {
        return None;
    }
    Message::from_record(text)
}

/// Read a whole session transcript once
pub fn read_conversation(path: &Path) -> Result<Vec<Message>, TranscriptError> {
    TranscriptReader::new(path).read()
}
