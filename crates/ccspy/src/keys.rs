//! Keyboard control for watch mode

use ccspy_analysis::AnalysisKind;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Analyze(AnalysisKind),
    Help,
    Quit,
}

pub fn map_key(key_event: KeyEvent) -> Option<KeyAction> {
    if key_event.kind != KeyEventKind::Press {
        return None;
    }
    if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(KeyAction::Quit);
    }

    match key_event.code {
        KeyCode::Char('a') | KeyCode::Char('A') => Some(KeyAction::Analyze(AnalysisKind::Summary)),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(KeyAction::Analyze(AnalysisKind::Security)),
        KeyCode::Char('h') | KeyCode::Char('?') => Some(KeyAction::Help),
        KeyCode::Char('q') | KeyCode::Esc => Some(KeyAction::Quit),
        _ => None,
    }
}

/// Keeps the terminal in raw mode until dropped
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> std::io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(err) = crossterm::terminal::disable_raw_mode() {
            tracing::warn!(error = %err, "failed to restore terminal mode");
        }
    }
}

/// Read keys on a blocking thread until `stop` is set or the receiver goes away
pub fn spawn_reader(
    actions: mpsc::UnboundedSender<KeyAction>,
    stop: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        while !stop.load(Ordering::SeqCst) {
            match next_action() {
                Ok(Some(action)) => {
                    if actions.send(action).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::debug!(error = %err, "keyboard input unavailable");
                    break;
                }
            }
        }
    })
}

fn next_action() -> std::io::Result<Option<KeyAction>> {
    if !event::poll(Duration::from_millis(100))? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key_event) => Ok(map_key(key_event)),
        _ => Ok(None),
    }
}
