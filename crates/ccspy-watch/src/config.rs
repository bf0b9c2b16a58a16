//! Configuration for watch mode

use ccspy_transcript::Message;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Where the analysis window of a watched session begins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchStart {
    /// Only messages written after watching starts
    Now,
    /// Messages timestamped within this long before watching starts
    LookBack(Duration),
    /// A fixed message index
    Index(usize),
}

impl WatchStart {
    /// Resolve to a message index into `conversation`
    ///
    /// For `LookBack`, the first message at or after the cutoff wins.
    /// Messages without a timestamp never qualify. If nothing qualifies
    /// the window starts at the end.
    pub fn resolve(&self, conversation: &[Message], now: DateTime<Utc>) -> usize {
        match *self {
            WatchStart::Now => conversation.len(),
            WatchStart::Index(index) => index.min(conversation.len()),
            WatchStart::LookBack(window) => {
                let Ok(window) = chrono::Duration::from_std(window) else {
                    return 0;
                };
                let cutoff = now - window;
                conversation
                    .iter()
                    .position(|m| m.timestamp.is_some_and(|ts| ts >= cutoff))
                    .unwrap_or(conversation.len())
            }
        }
    }
}

/// Watch engine configuration
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Delay between transcript re-reads
    pub poll_interval: Duration,

    /// Quiet time after the last growth before automatic analysis
    pub idle_threshold: Duration,

    /// New assistant tokens needed since the last analysis
    pub token_threshold: usize,

    /// Interactions sent per analysis (most recent)
    pub interaction_limit: usize,

    pub start: WatchStart,

    /// Idle time before progress events are emitted
    pub progress_delay: Duration,
}

impl WatchConfig {
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            idle_threshold: Duration::from_secs(15),
            token_threshold: 1000,
            interaction_limit: 10,
            start: WatchStart::Now,
            progress_delay: Duration::from_secs(3),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self::new()
    }
}
