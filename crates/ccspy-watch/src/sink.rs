//! Events the watch engine reports to its display

use ccspy_analysis::{AnalysisError, AnalysisKind, AnalysisResult};
use ccspy_transcript::Message;
use std::time::Duration;

/// Who asked for an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Idle threshold and token threshold were both reached
    Automatic,
    /// Explicit request through the handle
    Manual,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// Watching began; `backlog` holds the messages already in the window
    Started {
        message_count: usize,
        watch_start_index: usize,
        backlog: Vec<Message>,
    },
    /// Messages appended since the previous poll, in file order
    NewMessages(Vec<Message>),
    /// The transcript shrank and is being followed from the start again
    SessionReset { previous_count: usize },
    /// Advisory idle countdown
    Waiting {
        idle: Duration,
        new_tokens: usize,
        token_threshold: usize,
    },
    AnalysisStarted {
        kind: AnalysisKind,
        trigger: Trigger,
        interactions: usize,
    },
    AnalysisCompleted {
        kind: AnalysisKind,
        trigger: Trigger,
        result: AnalysisResult,
    },
    AnalysisFailed {
        kind: AnalysisKind,
        trigger: Trigger,
        error: AnalysisError,
    },
    /// A manual trigger arrived while another analysis was running
    TriggerRejected { kind: AnalysisKind },
    Stopped,
}

/// Receives engine events; runs on the engine task and must not block
pub trait WatchSink: Send {
    fn emit(&mut self, event: &WatchEvent);
}
