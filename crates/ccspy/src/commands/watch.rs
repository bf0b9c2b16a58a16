use crate::cli::WatchArgs;
use crate::commands::resolve_session;
use crate::display::{TerminalSink, HELP};
use crate::keys::{self, KeyAction, RawModeGuard};
use crate::settings::Settings;
use ccspy_analysis::ChatClient;
use ccspy_transcript::{Paths, SessionFile};
use ccspy_watch::{MarkdownLog, WatchConfig, WatchStart};
use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn watch_start(minutes_since: Option<u64>) -> WatchStart {
    match minutes_since {
        Some(minutes) => WatchStart::LookBack(Duration::from_secs(minutes.saturating_mul(60))),
        None => WatchStart::Now,
    }
}

pub fn run(args: WatchArgs) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let settings = Settings::load(&paths.settings_file())?;
    let session = resolve_session(&paths, args.session.as_deref())?;

    let config = settings.watch_config(watch_start(args.minutes_since), args.archer_limit);
    let client = ChatClient::new(settings.client_config(args.nano));
    let log = match &args.log_file {
        Some(path) => {
            println!("Logging to {}", path.display());
            Some(MarkdownLog::create(path)?)
        }
        None => None,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(watch_session(session, config, client, log))
}

async fn watch_session(
    session: SessionFile,
    config: WatchConfig,
    client: ChatClient,
    log: Option<MarkdownLog>,
) -> anyhow::Result<()> {
    println!("Session {}", session.id);
    println!("File {}", session.path.display());

    let interactive = std::io::stdin().is_terminal();
    let _raw_mode = if interactive {
        Some(RawModeGuard::enable()?)
    } else {
        None
    };

    let stop = Arc::new(AtomicBool::new(false));
    let (key_tx, mut key_rx) = mpsc::unbounded_channel();
    let reader = if interactive {
        Some(keys::spawn_reader(key_tx, Arc::clone(&stop)))
    } else {
        drop(key_tx);
        None
    };

    let (handle, mut task) = ccspy_watch::start(
        &session.path,
        config,
        Arc::new(client),
        Box::new(TerminalSink::new()),
        log,
    );

    let mut keys_open = true;
    loop {
        tokio::select! {
            result = &mut task => {
                result?;
                break;
            }
            key = key_rx.recv(), if keys_open => match key {
                Some(KeyAction::Analyze(kind)) => {
                    if let Err(err) = handle.run_analysis_now(kind).await {
                        tracing::debug!(%kind, error = %err, "manual analysis not started");
                    }
                }
                Some(KeyAction::Help) => print!("{}\r\n", HELP),
                Some(KeyAction::Quit) => handle.cancel(),
                None => keys_open = false,
            },
            _ = tokio::signal::ctrl_c() => handle.cancel(),
        }
    }

    stop.store(true, Ordering::SeqCst);
    if let Some(reader) = reader {
        let _ = reader.join();
    }
    Ok(())
}
