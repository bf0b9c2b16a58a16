//! Plain-text log of a watch session

use crate::sink::{WatchEvent, WatchSink};
use ccspy_transcript::{append_line, ContentBlock, Message, Role};
use std::path::{Path, PathBuf};

const ASSISTANT_PREVIEW_CHARS: usize = 500;

/// Appends watch events to a markdown-flavoured log file
///
/// Write failures are reported through `tracing` and otherwise ignored.
#[derive(Debug)]
pub struct MarkdownLog {
    path: PathBuf,
}

impl MarkdownLog {
    /// Start a log at `path` with a header carrying the start time
    pub fn create(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let started = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        append_line(
            &path,
            &format!("# Claude Code Watch Log\n\nStarted: {}\n", started),
        )?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, line: &str) {
        if let Err(err) = append_line(&self.path, line) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to write watch log");
        }
    }
}

impl WatchSink for MarkdownLog {
    fn emit(&mut self, event: &WatchEvent) {
        for line in format_event(event) {
            self.write(&line);
        }
    }
}

/// Log lines for one event; events with nothing worth keeping produce none
pub fn format_event(event: &WatchEvent) -> Vec<String> {
    match event {
        WatchEvent::Started {
            message_count,
            watch_start_index,
            backlog,
        } => {
            let mut lines = vec![format!(
                "Watching from message {} of {}\n",
                watch_start_index, message_count
            )];
            lines.extend(backlog.iter().flat_map(format_message));
            lines
        }
        WatchEvent::NewMessages(messages) => messages.iter().flat_map(format_message).collect(),
        WatchEvent::SessionReset { previous_count } => vec![format!(
            "--- transcript reset ({} messages before) ---\n",
            previous_count
        )],
        WatchEvent::AnalysisCompleted { kind, result, .. } => vec![format!(
            "## {} ({})\n\n{}\n",
            kind.title(),
            chrono::Local::now().format("%H:%M:%S"),
            result.text
        )],
        WatchEvent::AnalysisFailed { kind, error, .. } => {
            vec![format!("**{} failed:** {}\n", kind, error)]
        }
        WatchEvent::Stopped => vec!["Watch stopped\n".to_string()],
        WatchEvent::Waiting { .. }
        | WatchEvent::AnalysisStarted { .. }
        | WatchEvent::TriggerRejected { .. } => Vec::new(),
    }
}

fn format_message(message: &Message) -> Vec<String> {
    let mut lines = Vec::new();
    match message.role {
        Role::User => {
            if message.is_tool_result() {
                return lines;
            }
            if let Some(text) = message.first_text() {
                lines.push(format!("**User:** {}\n", text));
            }
        }
        Role::Assistant => {
            for block in &message.content {
                match block {
                    ContentBlock::Text { text } => {
                        lines.push(format!("**Assistant:** {}\n", preview(text)));
                    }
                    ContentBlock::ToolUse { name, .. } => {
                        lines.push(format!("**Tool:** {}\n", name));
                    }
                    _ => {}
                }
            }
        }
    }
    lines
}

fn preview(text: &str) -> String {
    if text.chars().count() <= ASSISTANT_PREVIEW_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(ASSISTANT_PREVIEW_CHARS).collect();
    format!("{}...", cut)
}
