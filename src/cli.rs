//! CLI definitions for igf.
//!
//! Uses clap for argument parsing with derive macros.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// igf - Find Instagram accounts that don't follow you back
#[derive(Parser, Debug)]
#[command(name = "igf")]
#[command(version)]
#[command(about = "Fast CLI for finding Instagram accounts that don't follow you back")]
#[command(long_about = r#"
igf (instagram follow-check) - A command-line tool that compares your
Instagram followers and following lists and shows who doesn't follow
you back.

igf never asks for your password. It reads the session you already have
in your browser from an exported cookie file, walks the two relationship
lists page by page (pausing between pages to stay under the rate limit),
and keeps the most recent result locally so you can reopen it any time.

Quick start:
  1. Log into instagram.com in your browser
  2. Export its cookies (Netscape format) with any cookie-export extension
  3. Run: igf analyze --cookies /path/to/cookies.txt
  4. Reopen later: igf results
"#)]
pub struct Cli {
    /// Path to the database file
    #[arg(long, env = "IGF_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Path to the exported browser cookie file
    #[arg(long, env = "IGF_COOKIES", global = true)]
    pub cookies: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Be verbose (show debug info)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Be quiet (suppress non-error output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch both relationship lists and show who doesn't follow back
    Analyze(AnalyzeArgs),

    /// Show the most recent analysis result
    Results(ResultsArgs),

    /// Show the Instagram user id of the current session
    Whoami,

    /// Show or manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Analyze this user id instead of the session's own
    #[arg(long)]
    pub user_id: Option<String>,

    /// Pause between page requests, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Safety cap on pages per list (0 = unlimited)
    #[arg(long)]
    pub max_pages: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ResultsArgs {
    /// Limit number of accounts shown
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Show current configuration
    #[arg(long)]
    pub show: bool,

    /// Write a default config file to the standard location
    #[arg(long)]
    pub init: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[derive(ValueEnum, Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
    Compact,
    Csv,
}
