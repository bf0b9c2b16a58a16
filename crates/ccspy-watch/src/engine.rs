//! Watch engine actor: tails a transcript and decides when to analyze it

use crate::config::WatchConfig;
use crate::log::MarkdownLog;
use crate::sink::{Trigger, WatchEvent, WatchSink};
use crate::state::{TickAction, WatchState};
use ccspy_analysis::{
    extract_interactions, AnalysisError, AnalysisKind, AnalysisResult, Analyzer,
};
use ccspy_transcript::{ConversationSource, Message, TranscriptReader};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};

/// Why a manual analysis request was not started
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TriggerError {
    #[error("an analysis is already running")]
    Busy,

    #[error("watch has stopped")]
    Stopped,
}

enum Command {
    Trigger {
        kind: AnalysisKind,
        reply: oneshot::Sender<Result<(), TriggerError>>,
    },
    Cancel,
}

/// Control surface of a running engine; cheap to clone and usable from any thread
#[derive(Debug, Clone)]
pub struct WatchHandle {
    commands: mpsc::UnboundedSender<Command>,
    cancelled: Arc<AtomicBool>,
}

impl WatchHandle {
    /// Stop the engine; an analysis in flight is abandoned
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        let _ = self.commands.send(Command::Cancel);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Start an analysis immediately
    ///
    /// Resolves once the engine has accepted or rejected the request, not
    /// when the analysis finishes.
    pub async fn run_analysis_now(&self, kind: AnalysisKind) -> Result<(), TriggerError> {
        if self.is_cancelled() {
            return Err(TriggerError::Stopped);
        }
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Trigger { kind, reply })
            .map_err(|_| TriggerError::Stopped)?;
        response.await.unwrap_or(Err(TriggerError::Stopped))
    }
}

struct InFlight {
    kind: AnalysisKind,
    trigger: Trigger,
    /// Window token total the analysis covers
    tokens: usize,
    /// Session generation at launch
    session: u64,
    handle: JoinHandle<Result<AnalysisResult, AnalysisError>>,
}

/// Polls one conversation source and runs at most one analysis at a time
pub struct WatchEngine {
    config: WatchConfig,
    source: Box<dyn ConversationSource>,
    analyzer: Arc<dyn Analyzer>,
    sink: Box<dyn WatchSink>,
    log: Option<MarkdownLog>,
    commands: mpsc::UnboundedReceiver<Command>,
    cancelled: Arc<AtomicBool>,
    last_conversation: Vec<Message>,
    in_flight: Option<InFlight>,
}

impl WatchEngine {
    pub fn new(
        config: WatchConfig,
        source: Box<dyn ConversationSource>,
        analyzer: Arc<dyn Analyzer>,
        sink: Box<dyn WatchSink>,
    ) -> (Self, WatchHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let engine = Self {
            config,
            source,
            analyzer,
            sink,
            log: None,
            commands: rx,
            cancelled: Arc::clone(&cancelled),
            last_conversation: Vec::new(),
            in_flight: None,
        };
        let handle = WatchHandle {
            commands: tx,
            cancelled,
        };
        (engine, handle)
    }

    /// Also record events to a plain-text log
    pub fn with_log(mut self, log: MarkdownLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Run until cancelled
    pub async fn run(mut self) {
        let initial = self.read().unwrap_or_default();
        let start = self.config.start.resolve(&initial, chrono::Utc::now());
        let mut state = WatchState::new(initial.len(), start, Instant::now());
        tracing::info!(
            messages = initial.len(),
            start_index = state.watch_start_index(),
            "watch started"
        );
        self.emit(WatchEvent::Started {
            message_count: initial.len(),
            watch_start_index: state.watch_start_index(),
            backlog: state.window(&initial).to_vec(),
        });
        self.last_conversation = initial;

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await;

        let mut commands_open = true;
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv(), if commands_open => match command {
                    Some(Command::Trigger { kind, reply }) => {
                        let accepted = self.manual(kind, &mut state);
                        let _ = reply.send(accepted);
                    }
                    Some(Command::Cancel) => break,
                    None => commands_open = false,
                },
                outcome = join_in_flight(&mut self.in_flight) => {
                    if let Some(done) = self.in_flight.take() {
                        self.finish(done, outcome, &mut state);
                    }
                }
                _ = ticker.tick() => {
                    if self.cancelled.load(Ordering::SeqCst) {
                        break;
                    }
                    self.tick(&mut state);
                }
            }
        }

        if let Some(abandoned) = self.in_flight.take() {
            tracing::info!(kind = %abandoned.kind, "abandoning analysis in flight");
            abandoned.handle.abort();
        }
        tracing::info!("watch stopped");
        self.emit(WatchEvent::Stopped);
    }

    fn read(&mut self) -> Option<Vec<Message>> {
        match self.source.read() {
            Ok(conversation) => Some(conversation),
            Err(err) => {
                tracing::debug!(error = %err, "transcript read failed; retrying next tick");
                None
            }
        }
    }

    fn tick(&mut self, state: &mut WatchState) {
        let Some(conversation) = self.read() else {
            return;
        };

        match state.observe(Instant::now(), &conversation, &self.config) {
            TickAction::Growth { range, reset } => {
                if let Some(previous_count) = reset {
                    tracing::info!(previous_count, "transcript shrank; treating as a new session");
                    self.emit(WatchEvent::SessionReset { previous_count });
                }
                if !range.is_empty() {
                    self.emit(WatchEvent::NewMessages(conversation[range].to_vec()));
                }
            }
            TickAction::Analyze {
                idle,
                total_tokens,
                new_tokens,
            } => {
                tracing::info!(
                    idle_secs = idle.as_secs(),
                    new_tokens,
                    "idle threshold reached; starting analysis"
                );
                self.launch(
                    AnalysisKind::Summary,
                    Trigger::Automatic,
                    state,
                    &conversation,
                    total_tokens,
                );
            }
            TickAction::Idle {
                idle,
                new_tokens,
                report,
            } => {
                if report {
                    self.emit(WatchEvent::Waiting {
                        idle,
                        new_tokens,
                        token_threshold: self.config.token_threshold,
                    });
                }
            }
        }

        self.last_conversation = conversation;
    }

    fn manual(&mut self, kind: AnalysisKind, state: &mut WatchState) -> Result<(), TriggerError> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(TriggerError::Stopped);
        }
        if state.try_begin_manual().is_err() {
            tracing::debug!(%kind, "manual trigger rejected; analysis in flight");
            self.emit(WatchEvent::TriggerRejected { kind });
            return Err(TriggerError::Busy);
        }

        let conversation = match self.read() {
            Some(conversation) => conversation,
            None => self.last_conversation.clone(),
        };
        let tokens = state.window_tokens(&conversation);
        self.launch(kind, Trigger::Manual, state, &conversation, tokens);
        Ok(())
    }

    fn launch(
        &mut self,
        kind: AnalysisKind,
        trigger: Trigger,
        state: &WatchState,
        conversation: &[Message],
        tokens: usize,
    ) {
        let interactions =
            extract_interactions(state.window(conversation), self.config.interaction_limit);
        self.emit(WatchEvent::AnalysisStarted {
            kind,
            trigger,
            interactions: interactions.len(),
        });

        let analyzer = Arc::clone(&self.analyzer);
        let handle = tokio::spawn(async move { analyzer.analyze(&interactions, kind).await });
        self.in_flight = Some(InFlight {
            kind,
            trigger,
            tokens,
            session: state.session(),
            handle,
        });
    }

    fn finish(
        &mut self,
        done: InFlight,
        outcome: Result<Result<AnalysisResult, AnalysisError>, JoinError>,
        state: &mut WatchState,
    ) {
        let InFlight {
            kind,
            trigger,
            tokens,
            session,
            ..
        } = done;

        let event = match outcome {
            Ok(Ok(result)) => {
                state.finish_analysis(session, Some(tokens));
                WatchEvent::AnalysisCompleted {
                    kind,
                    trigger,
                    result,
                }
            }
            Ok(Err(error)) => {
                state.finish_analysis(session, None);
                WatchEvent::AnalysisFailed {
                    kind,
                    trigger,
                    error,
                }
            }
            Err(join_error) => {
                state.finish_analysis(session, None);
                tracing::warn!(%kind, error = %join_error, "analysis task failed");
                WatchEvent::AnalysisFailed {
                    kind,
                    trigger,
                    error: AnalysisError::Internal(join_error.to_string()),
                }
            }
        };
        self.emit(event);
    }

    fn emit(&mut self, event: WatchEvent) {
        self.sink.emit(&event);
        if let Some(log) = self.log.as_mut() {
            log.emit(&event);
        }
    }
}

/// Resolves when the analysis in `slot` finishes; never resolves when empty
async fn join_in_flight(
    slot: &mut Option<InFlight>,
) -> Result<Result<AnalysisResult, AnalysisError>, JoinError> {
    match slot.as_mut() {
        Some(in_flight) => (&mut in_flight.handle).await,
        None => std::future::pending().await,
    }
}

/// Watch a session file on the current runtime
pub fn start(
    session_file: &Path,
    config: WatchConfig,
    analyzer: Arc<dyn Analyzer>,
    sink: Box<dyn WatchSink>,
    log: Option<MarkdownLog>,
) -> (WatchHandle, JoinHandle<()>) {
    let source = Box::new(TranscriptReader::new(session_file));
    let (mut engine, handle) = WatchEngine::new(config, source, analyzer, sink);
    if let Some(log) = log {
        engine = engine.with_log(log);
    }
    (handle, tokio::spawn(engine.run()))
}
