pub fn run() -> anyhow::Result<()> {
    println!("ccspy {}", env!("CARGO_PKG_VERSION"));
    println!("Inspector and watcher for Claude Code conversation logs");
    Ok(())
}
