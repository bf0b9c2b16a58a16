#![allow(dead_code)]

use async_trait::async_trait;
use ccspy_analysis::{AnalysisError, AnalysisKind, AnalysisResult, Analyzer, Interaction};
use ccspy_transcript::{ContentBlock, ConversationSource, Message, Role, TranscriptError};
use ccspy_watch::{WatchConfig, WatchEngine, WatchEvent, WatchHandle, WatchSink};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

pub fn long_reply(chars: usize) -> Message {
    Message::new(
        Role::Assistant,
        vec![ContentBlock::Text {
            text: "x".repeat(chars),
        }],
    )
}

#[derive(Default)]
struct SourceState {
    messages: Vec<Message>,
    failing: bool,
    reads: usize,
}

/// In-memory transcript the test appends to while the engine polls it
#[derive(Clone, Default)]
pub struct ScriptedSource {
    inner: Arc<Mutex<SourceState>>,
}

impl ScriptedSource {
    pub fn new(messages: Vec<Message>) -> Self {
        let source = Self::default();
        source.inner.lock().unwrap().messages = messages;
        source
    }

    pub fn push(&self, message: Message) {
        self.inner.lock().unwrap().messages.push(message);
    }

    pub fn replace(&self, messages: Vec<Message>) {
        self.inner.lock().unwrap().messages = messages;
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().unwrap().failing = failing;
    }

    pub fn reads(&self) -> usize {
        self.inner.lock().unwrap().reads
    }
}

impl ConversationSource for ScriptedSource {
    fn read(&mut self) -> Result<Vec<Message>, TranscriptError> {
        let mut inner = self.inner.lock().unwrap();
        inner.reads += 1;
        if inner.failing {
            return Err(TranscriptError::Io {
                path: "scripted.jsonl".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "unavailable"),
            });
        }
        Ok(inner.messages.clone())
    }
}

/// Analyzer that sleeps for `delay` and records how it was called
#[derive(Default)]
pub struct StubAnalyzer {
    delay: Duration,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    failures: Mutex<VecDeque<AnalysisError>>,
    kinds: Mutex<Vec<AnalysisKind>>,
}

impl StubAnalyzer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }

    /// Make the next call fail with `error`
    pub fn fail_next(&self, error: AnalysisError) {
        self.failures.lock().unwrap().push_back(error);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn kinds(&self) -> Vec<AnalysisKind> {
        self.kinds.lock().unwrap().clone()
    }
}

#[async_trait]
impl Analyzer for StubAnalyzer {
    async fn analyze(
        &self,
        interactions: &[Interaction],
        kind: AnalysisKind,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.kinds.lock().unwrap().push(kind);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(AnalysisResult {
            text: format!("{} of {} interactions", kind, interactions.len()),
            tokens_used: 42,
            model: "stub".to_string(),
        })
    }
}

/// Keeps every event for later assertions
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<WatchEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<WatchEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&WatchEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| matches(e)).count()
    }

    /// Every message delivered through `NewMessages`, flattened
    pub fn new_messages(&self) -> Vec<Message> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                WatchEvent::NewMessages(batch) => Some(batch.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

impl WatchSink for RecordingSink {
    fn emit(&mut self, event: &WatchEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub struct Harness {
    pub source: ScriptedSource,
    pub analyzer: Arc<StubAnalyzer>,
    pub sink: RecordingSink,
    pub handle: WatchHandle,
    pub task: JoinHandle<()>,
}

/// Spawn an engine over `messages` and let it take its first read
pub async fn spawn_engine(
    messages: Vec<Message>,
    analyzer: Arc<StubAnalyzer>,
    config: WatchConfig,
) -> Harness {
    let source = ScriptedSource::new(messages);
    let sink = RecordingSink::default();
    let (engine, handle) = WatchEngine::new(
        config,
        Box::new(source.clone()),
        analyzer.clone(),
        Box::new(sink.clone()),
    );
    let task = tokio::spawn(engine.run());
    tokio::time::sleep(Duration::from_millis(100)).await;

    Harness {
        source,
        analyzer,
        sink,
        handle,
        task,
    }
}
