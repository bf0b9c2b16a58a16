//! Watch mode: follow a live session transcript and analyze it when it goes quiet

mod config;
mod engine;
mod log;
mod sink;
mod state;

pub use config::{WatchConfig, WatchStart};
pub use engine::{start, TriggerError, WatchEngine, WatchHandle};
pub use log::{format_event, MarkdownLog};
pub use sink::{Trigger, WatchEvent, WatchSink};
pub use state::{Busy, Phase, TickAction, WatchState};
