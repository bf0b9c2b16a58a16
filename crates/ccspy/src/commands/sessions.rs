use ccspy_transcript::{list_sessions, Paths, SessionFile};

fn format_session(session: &SessionFile, size: u64) -> String {
    let modified: chrono::DateTime<chrono::Local> = session.modified.into();
    format!(
        "{}  {}  {:>6} KB",
        modified.format("%Y-%m-%d %H:%M"),
        session.id,
        size.div_ceil(1024)
    )
}

pub fn run() -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let project_dir = paths.project_dir()?;

    if !project_dir.is_dir() {
        println!("No sessions for this directory");
        return Ok(());
    }

    let sessions = list_sessions(&project_dir)?;
    if sessions.is_empty() {
        println!("No sessions for this directory");
        return Ok(());
    }

    println!("Sessions in {} (newest first)", project_dir.display());
    for session in &sessions {
        let size = std::fs::metadata(&session.path).map(|m| m.len()).unwrap_or(0);
        println!("  {}", format_session(session, size));
    }
    Ok(())
}
