//! Per-session watch state and the idle trigger policy

use crate::config::WatchConfig;
use ccspy_transcript::{conversation_tokens, Message};
use std::ops::Range;
use std::time::Duration;
use tokio::time::Instant;

/// What the engine is doing as of the last tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    IdleWatching,
    GrowthDetected,
    IdleCounting,
    Analyzing,
}

/// Outcome of observing one freshly read conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickAction {
    /// New messages at `range`; `reset` carries the previous length when
    /// the transcript shrank
    Growth {
        range: Range<usize>,
        reset: Option<usize>,
    },
    /// Start the automatic analysis now
    Analyze {
        idle: Duration,
        total_tokens: usize,
        new_tokens: usize,
    },
    /// Nothing to do; `report` is set once per whole idle second past the
    /// progress delay
    Idle {
        idle: Duration,
        new_tokens: usize,
        report: bool,
    },
}

/// Returned when an analysis is already in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Busy;

/// Cursor, idle timer and token baseline of one watched session
#[derive(Debug, Clone)]
pub struct WatchState {
    last_message_count: usize,
    last_message_time: Instant,
    last_analysis_token_count: usize,
    analysis_pending: bool,
    watch_start_index: usize,
    /// Bumped each time the transcript shrinks
    session: u64,
    /// Growth time of the idle period the automatic trigger already used
    auto_fired_period: Option<Instant>,
    last_progress_second: Option<u64>,
    phase: Phase,
}

impl WatchState {
    pub fn new(message_count: usize, watch_start_index: usize, now: Instant) -> Self {
        Self {
            last_message_count: message_count,
            last_message_time: now,
            last_analysis_token_count: 0,
            analysis_pending: false,
            watch_start_index: watch_start_index.min(message_count),
            session: 0,
            auto_fired_period: None,
            last_progress_second: None,
            phase: Phase::IdleWatching,
        }
    }

    pub fn last_message_count(&self) -> usize {
        self.last_message_count
    }

    pub fn last_message_time(&self) -> Instant {
        self.last_message_time
    }

    pub fn last_analysis_token_count(&self) -> usize {
        self.last_analysis_token_count
    }

    pub fn analysis_pending(&self) -> bool {
        self.analysis_pending
    }

    pub fn watch_start_index(&self) -> usize {
        self.watch_start_index
    }

    /// Generation of the watched session; an analysis launched under an
    /// older generation no longer describes the transcript
    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Messages eligible for analysis
    pub fn window<'a>(&self, conversation: &'a [Message]) -> &'a [Message] {
        &conversation[self.watch_start_index.min(conversation.len())..]
    }

    /// Token estimate of the analysis window
    pub fn window_tokens(&self, conversation: &[Message]) -> usize {
        conversation_tokens(self.window(conversation))
    }

    /// Advance the state for one poll of the transcript
    pub fn observe(
        &mut self,
        now: Instant,
        conversation: &[Message],
        config: &WatchConfig,
    ) -> TickAction {
        let len = conversation.len();

        if len < self.last_message_count {
            let previous = self.last_message_count;
            self.watch_start_index = 0;
            self.last_analysis_token_count = 0;
            self.session += 1;
            self.grow(now, len);
            return TickAction::Growth {
                range: 0..len,
                reset: Some(previous),
            };
        }

        if len > self.last_message_count {
            let range = self.last_message_count..len;
            self.grow(now, len);
            return TickAction::Growth { range, reset: None };
        }

        let idle = now.saturating_duration_since(self.last_message_time);
        let total_tokens = self.window_tokens(conversation);
        let new_tokens = total_tokens.saturating_sub(self.last_analysis_token_count);

        if self.analysis_pending {
            self.phase = Phase::Analyzing;
            return TickAction::Idle {
                idle,
                new_tokens,
                report: false,
            };
        }

        if idle >= config.idle_threshold
            && new_tokens >= config.token_threshold
            && self.auto_fired_period != Some(self.last_message_time)
        {
            self.auto_fired_period = Some(self.last_message_time);
            self.analysis_pending = true;
            self.phase = Phase::Analyzing;
            return TickAction::Analyze {
                idle,
                total_tokens,
                new_tokens,
            };
        }

        self.phase = Phase::IdleCounting;
        let second = idle.as_secs();
        let report = idle >= config.progress_delay && self.last_progress_second != Some(second);
        if report {
            self.last_progress_second = Some(second);
        }
        TickAction::Idle {
            idle,
            new_tokens,
            report,
        }
    }

    fn grow(&mut self, now: Instant, len: usize) {
        self.last_message_count = len;
        self.last_message_time = now;
        self.last_progress_second = None;
        self.phase = Phase::GrowthDetected;
    }

    /// Claim the analysis slot for a manual trigger
    ///
    /// The idle timer is left alone.
    pub fn try_begin_manual(&mut self) -> Result<(), Busy> {
        if self.analysis_pending {
            return Err(Busy);
        }
        self.analysis_pending = true;
        self.phase = Phase::Analyzing;
        Ok(())
    }

    /// Release the analysis slot; a successful analysis moves the token
    /// baseline to the total it covered
    ///
    /// `session` is the generation the analysis was launched under. When the
    /// transcript was reset since then the baseline stays where the reset put
    /// it.
    pub fn finish_analysis(&mut self, session: u64, analyzed_tokens: Option<usize>) {
        self.analysis_pending = false;
        match analyzed_tokens {
            Some(tokens) if session == self.session => self.last_analysis_token_count = tokens,
            Some(_) => tracing::debug!(
                launched = session,
                current = self.session,
                "analysis finished for a previous session; baseline kept"
            ),
            None => {}
        }
        self.phase = Phase::IdleWatching;
    }
}
