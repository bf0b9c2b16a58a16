mod cli;
mod commands;
mod display;
mod keys;
mod settings;

use clap::Parser;
use cli::{Cli, Commands};
use ccspy_analysis::AnalysisKind;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never interleave with the watch display
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch(args) => commands::watch::run(args),
        Commands::Archer(args) => commands::analyze::run(AnalysisKind::Summary, args),
        Commands::Security(args) => commands::analyze::run(AnalysisKind::Security, args),
        Commands::Sessions => commands::sessions::run(),
        Commands::Show { id } => commands::show::run(&id),
        Commands::Config { init } => commands::config::run(init),
        Commands::Version => commands::version::run(),
    }
}
