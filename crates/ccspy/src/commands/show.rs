use crate::commands::resolve_session;
use crate::display::render_message;
use ccspy_transcript::{read_conversation, Paths};

pub fn run(id: &str) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let session = resolve_session(&paths, Some(id))?;
    let conversation = read_conversation(&session.path)?;

    if conversation.is_empty() {
        println!("Session {} has no messages", session.id);
        return Ok(());
    }

    println!("Session {} ({} messages)\n", session.id, conversation.len());
    for message in &conversation {
        for line in render_message(message) {
            println!("{}", line);
        }
    }
    Ok(())
}
