use crate::cli::AnalyzeArgs;
use crate::commands::resolve_session;
use crate::display::{render_analysis, render_error};
use crate::settings::Settings;
use ccspy_analysis::{extract_interactions, AnalysisKind, Analyzer, ChatClient};
use ccspy_transcript::{read_conversation, Paths};

/// One-shot analysis of the most recent interactions of a session
pub fn run(kind: AnalysisKind, args: AnalyzeArgs) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let settings = Settings::load(&paths.settings_file())?;
    let session = resolve_session(&paths, args.session.as_deref())?;
    let conversation = read_conversation(&session.path)?;

    let limit = settings.interaction_limit(args.limit);
    let interactions = extract_interactions(&conversation, limit);
    if interactions.is_empty() {
        println!("No interactions to analyze in session {}", session.id);
        return Ok(());
    }

    println!(
        "Running {} over the last {} interactions of session {}...",
        kind,
        interactions.len(),
        session.id
    );

    let client = ChatClient::new(settings.client_config(args.nano));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match runtime.block_on(client.analyze(&interactions, kind)) {
        Ok(result) => {
            for line in render_analysis(kind, &result) {
                println!("{}", line);
            }
            Ok(())
        }
        Err(err) => {
            for line in render_error(kind, &err) {
                eprintln!("{}", line);
            }
            Err(err.into())
        }
    }
}
