//! Terminal rendering of conversations and watch events

use ccspy_analysis::{AnalysisError, AnalysisKind, AnalysisResult};
use ccspy_transcript::{ContentBlock, Message, Role};
use ccspy_watch::{Trigger, WatchEvent, WatchSink};
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, queue};
use std::io::Write;

const TOOL_DETAIL_CHARS: usize = 80;

pub const HELP: &str = "Keys: a = Archer summary, s = security analysis, h = help, q = quit";

/// Lines for one message; tool results and thinking are not shown
pub fn render_message(message: &Message) -> Vec<String> {
    let mut lines = Vec::new();
    if message.is_tool_result() {
        return lines;
    }

    let time = message
        .timestamp
        .map(|ts| {
            ts.with_timezone(&chrono::Local)
                .format("%H:%M:%S ")
                .to_string()
        })
        .unwrap_or_default();

    for block in &message.content {
        match (message.role, block) {
            (Role::User, ContentBlock::Text { text }) => {
                lines.push(format!(
                    "{}{} {}",
                    time.clone().dark_grey(),
                    "User:".cyan().bold(),
                    text
                ));
            }
            (Role::Assistant, ContentBlock::Text { text }) => {
                lines.push(format!(
                    "{}{} {}",
                    time.clone().dark_grey(),
                    "Claude:".green().bold(),
                    text
                ));
            }
            (Role::Assistant, ContentBlock::ToolUse { name, input, .. }) => {
                let detail = tool_detail(input);
                lines.push(format!(
                    "  {} {} {}",
                    "tool".yellow(),
                    name.as_str().bold(),
                    detail
                ));
            }
            _ => {}
        }
    }
    lines
}

/// The most telling argument of a tool call, shortened
fn tool_detail(input: &serde_json::Value) -> String {
    let detail = ["file_path", "command", "pattern", "path", "url", "description"]
        .iter()
        .find_map(|key| input.get(key).and_then(|v| v.as_str()))
        .unwrap_or_default();
    let first_line = detail.lines().next().unwrap_or_default();
    if first_line.chars().count() > TOOL_DETAIL_CHARS {
        let cut: String = first_line.chars().take(TOOL_DETAIL_CHARS).collect();
        format!("{}...", cut)
    } else {
        first_line.to_string()
    }
}

pub fn render_analysis(kind: AnalysisKind, result: &AnalysisResult) -> Vec<String> {
    let rule = "=".repeat(60);
    let mut lines = vec![
        rule.clone().magenta().to_string(),
        kind.title().magenta().bold().to_string(),
        rule.magenta().to_string(),
    ];
    lines.extend(result.text.lines().map(String::from));
    lines.push(
        format!("({} tokens, {})", result.tokens_used, result.model)
            .dark_grey()
            .to_string(),
    );
    lines
}

pub fn render_error(kind: AnalysisKind, error: &AnalysisError) -> Vec<String> {
    let mut lines = vec![format!("{} {} failed: {}", "error:".red().bold(), kind, error)];
    if let Some(hint) = error.hint() {
        lines.push(format!("  {}", hint).dark_grey().to_string());
    }
    lines
}

fn render_event(event: &WatchEvent) -> Vec<String> {
    match event {
        WatchEvent::Started {
            message_count,
            watch_start_index,
            backlog,
        } => {
            let mut lines = vec![
                format!(
                    "Watching ({} messages so far, analysis window starts at {})",
                    message_count, watch_start_index
                ),
                HELP.dark_grey().to_string(),
            ];
            lines.extend(backlog.iter().flat_map(render_message));
            lines
        }
        WatchEvent::NewMessages(messages) => messages.iter().flat_map(render_message).collect(),
        WatchEvent::SessionReset { previous_count } => vec![format!(
            "Transcript was reset ({} messages before); following from the start",
            previous_count
        )
        .yellow()
        .to_string()],
        WatchEvent::Waiting { .. } => Vec::new(),
        WatchEvent::AnalysisStarted {
            kind,
            trigger,
            interactions,
        } => {
            let reason = match trigger {
                Trigger::Automatic => "idle",
                Trigger::Manual => "requested",
            };
            vec![format!(
                "Running {} over {} interactions ({})...",
                kind, interactions, reason
            )
            .dark_grey()
            .to_string()]
        }
        WatchEvent::AnalysisCompleted { kind, result, .. } => render_analysis(*kind, result),
        WatchEvent::AnalysisFailed { kind, error, .. } => render_error(*kind, error),
        WatchEvent::TriggerRejected { kind } => vec![format!(
            "An analysis is already running; {} not started",
            kind
        )
        .yellow()
        .to_string()],
        WatchEvent::Stopped => vec!["Watch stopped".to_string()],
    }
}

fn status_line(event: &WatchEvent) -> Option<String> {
    match event {
        WatchEvent::Waiting {
            idle,
            new_tokens,
            token_threshold,
        } => Some(format!(
            "idle {}s, {}/{} new tokens",
            idle.as_secs(),
            new_tokens,
            token_threshold
        )),
        _ => None,
    }
}

/// Prints watch events to stdout; works in raw mode
#[derive(Debug, Default)]
pub struct TerminalSink {
    status_shown: bool,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&mut self, event: &WatchEvent) -> std::io::Result<()> {
        let mut out = std::io::stdout().lock();
        if self.status_shown {
            queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
            self.status_shown = false;
        }

        if let Some(status) = status_line(event) {
            write!(out, "{}", status.dark_grey())?;
            self.status_shown = true;
        } else {
            // Raw mode needs explicit carriage returns
            for line in render_event(event) {
                write!(out, "{}\r\n", line)?;
            }
        }
        out.flush()
    }
}

impl WatchSink for TerminalSink {
    fn emit(&mut self, event: &WatchEvent) {
        if let Err(err) = self.write(event) {
            tracing::warn!(error = %err, "failed to write to terminal");
        }
    }
}
