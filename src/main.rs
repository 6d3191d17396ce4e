//! igf - Instagram follow-back checker CLI
//!
//! Main entry point for the igf command-line tool.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, debug};
use tracing_subscriber::EnvFilter;

use igf::config::Config;
use igf::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_target(false)
        .without_time()
        .init();

    // Run the appropriate command
    match &cli.command {
        Commands::Analyze(args) => cmd_analyze(&cli, args).await,
        Commands::Results(args) => cmd_results(&cli, args),
        Commands::Whoami => cmd_whoami(&cli).await,
        Commands::Config(args) => cmd_config(&cli, args),
        Commands::Completions(args) => cmd_completions(args.clone()),
    }
}

/// Layered config with the global CLI flags applied on top.
fn load_config(cli: &Cli) -> Config {
    let mut config = Config::load();
    if let Some(db) = &cli.db {
        config.paths.db = Some(db.clone());
    }
    if let Some(cookies) = &cli.cookies {
        config.paths.cookies = Some(cookies.clone());
    }
    config
}

fn open_storage(config: &Config) -> Result<Storage> {
    let db_path = config.db_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Storage::open(&db_path)?)
}

async fn cmd_analyze(cli: &Cli, args: &cli::AnalyzeArgs) -> Result<()> {
    let mut config = load_config(cli);
    if let Some(delay_ms) = args.delay_ms {
        config.api.page_delay_ms = delay_ms;
    }
    if let Some(max_pages) = args.max_pages {
        config.api.max_pages = max_pages;
    }

    let storage = open_storage(&config)?;

    let cookies_path = config.cookies_path();
    let resolver = SessionResolver::new(&storage, &cookies_path);
    let Some(identity) = resolver.resolve().await else {
        anyhow::bail!("{}", IgfError::IdentityUnavailable);
    };

    let user_id = args.user_id.clone().unwrap_or(identity.user_id);
    debug!("Analyzing account {}", format_short_id(&user_id));

    let jar = CookieJar::load(&cookies_path)?;
    let transport = HttpTransport::new(&jar, config.api.base_url.clone(), config.api.page_size)?;
    let handle = ApiBridge::spawn(Arc::new(transport));
    let analyzer = Analyzer::new(handle, config.fetch_options());

    if !cli.quiet {
        println!("{}", "Analyzing followers...".bold().cyan());
    }

    let pb = if cli.quiet || config.output.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    let snapshot = match analyzer
        .run(&user_id, |p| {
            pb.set_message(format!(
                "Fetched {} {}...",
                format_number_usize(p.fetched),
                p.kind
            ));
        })
        .await
    {
        Ok(snapshot) => snapshot,
        Err(e) => {
            pb.finish_and_clear();
            if let Some(hint) = e.suggestion() {
                eprintln!("{} {}", "Hint:".cyan(), hint);
            }
            return Err(e.into());
        }
    };

    pb.finish_and_clear();

    if !cli.quiet {
        println!(
            "  {} {} followers",
            "✓".green(),
            format_number_usize(snapshot.followers_count)
        );
        println!(
            "  {} {} following",
            "✓".green(),
            format_number_usize(snapshot.following_count)
        );
        println!();
    }

    let sink = ResultSink::new(&storage);
    sink.deliver(&snapshot, &cli.format)?;

    Ok(())
}

fn cmd_results(cli: &Cli, args: &cli::ResultsArgs) -> Result<()> {
    let config = load_config(cli);
    let db_path = config.db_path();

    if !db_path.exists() {
        anyhow::bail!(
            "No analysis found. Run 'igf analyze' first.\n\
             Expected database at: {}",
            db_path.display()
        );
    }

    let storage = Storage::open(&db_path)?;
    let Some(mut accounts) = storage.last_results()? else {
        println!("{}", "No results found. Run 'igf analyze' first.".yellow());
        return Ok(());
    };

    if matches!(cli.format, OutputFormat::Text) {
        if let Some(at) = storage.last_run_at()? {
            println!("{}", format!("Analyzed {}", format_relative_date(at)).dimmed());
            println!();
        }
    }

    if let Some(limit) = args.limit {
        accounts.truncate(limit);
    }

    sink::present(&accounts, &cli.format)?;
    Ok(())
}

async fn cmd_whoami(cli: &Cli) -> Result<()> {
    let config = load_config(cli);
    let storage = open_storage(&config)?;

    let resolver = SessionResolver::new(&storage, config.cookies_path());
    if let Some(identity) = resolver.resolve().await {
        println!("{}", identity.user_id);
        return Ok(());
    }

    // Fall back to the id a previous resolution published.
    if let Some(user_id) = storage.user_id()? {
        println!("{} {}", user_id, "(cached)".dimmed());
        return Ok(());
    }

    anyhow::bail!("{}", IgfError::IdentityUnavailable);
}

fn cmd_config(cli: &Cli, args: &cli::ConfigArgs) -> Result<()> {
    let config = load_config(cli);

    if args.init {
        Config::default().save()?;
        if let Some(path) = Config::user_config_path() {
            println!("  {} Wrote default config to {}", "✓".green(), path.display());
        }
    }

    if args.show || !args.init {
        println!("{}", "Current Configuration".bold().cyan());
        println!("  Database:   {}", config.db_path().display());
        println!("  Cookies:    {}", config.cookies_path().display());
        println!("  API host:   {}", config.api.base_url);
        println!("  Page size:  {}", config.api.page_size);
        println!("  Page delay: {} ms", config.api.page_delay_ms);
        let max_pages = if config.api.max_pages == 0 {
            "unlimited".to_string()
        } else {
            config.api.max_pages.to_string()
        };
        println!("  Max pages:  {max_pages}");
    }

    Ok(())
}

fn cmd_completions(args: cli::CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    generate(args.shell, &mut cmd, "igf", &mut io::stdout());
    Ok(())
}
