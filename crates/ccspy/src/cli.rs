use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ccspy")]
#[command(version)]
#[command(about = "Inspect and watch Claude Code conversation logs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Follow the live session and analyze it when it goes quiet
    Watch(WatchArgs),

    /// Summarize intent and review quality of recent interactions
    Archer(AnalyzeArgs),

    /// Review recent interactions for security problems
    Security(AnalyzeArgs),

    /// List sessions for the current directory
    Sessions,

    /// Print one session's conversation
    Show {
        /// Session id (file name without .jsonl)
        id: String,
    },

    /// Show effective settings
    Config {
        /// Write the default settings file if none exists
        #[arg(long)]
        init: bool,
    },

    /// Print version information
    Version,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct WatchArgs {
    /// Session id to watch (defaults to the most recent one)
    #[arg(long)]
    pub session: Option<String>,

    /// Include messages from the last N minutes in the analysis window
    #[arg(long, value_name = "N")]
    pub minutes_since: Option<u64>,

    /// Also write the session to this log file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Use the smaller, cheaper model
    #[arg(long)]
    pub nano: bool,

    /// Interactions sent per analysis
    #[arg(long, value_name = "N")]
    pub archer_limit: Option<usize>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeArgs {
    /// Session id (defaults to the most recent one)
    #[arg(long)]
    pub session: Option<String>,

    /// Number of recent interactions to analyze
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Use the smaller, cheaper model
    #[arg(long)]
    pub nano: bool,
}
