//! Result persistence and presentation.
//!
//! The sink owns the single durable result slot. Persistence is always
//! attempted before anything is shown, so an independent `igf results`
//! invocation can recover the same result from storage even when it never
//! saw the in-memory snapshot.

use crate::cli::OutputFormat;
use crate::error::{Result, ResultExt};
use crate::model::{Account, AnalysisSnapshot};
use crate::storage::Storage;
use colored::Colorize;
use tracing::warn;

/// Writes analysis results to storage and hands them to the terminal.
pub struct ResultSink<'a> {
    storage: &'a Storage,
}

impl<'a> ResultSink<'a> {
    #[must_use]
    pub const fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Overwrite the single result slot with this snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if either storage write fails.
    pub fn persist(&self, snapshot: &AnalysisSnapshot) -> Result<()> {
        self.storage
            .set_last_results(&snapshot.not_following_back)?;
        self.storage.set_last_run_at(snapshot.generated_at)?;
        Ok(())
    }

    /// Persist the snapshot, then present it.
    ///
    /// A failed persist is logged and does not block presentation; the
    /// in-memory snapshot is still perfectly presentable.
    ///
    /// # Errors
    ///
    /// Returns an error if presentation fails.
    pub fn deliver(&self, snapshot: &AnalysisSnapshot, format: &OutputFormat) -> Result<()> {
        if let Err(e) = self.persist(snapshot) {
            warn!("Failed to persist analysis results: {e}");
        }
        present(&snapshot.not_following_back, format)
    }
}

/// Render a result list in the requested output format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn present(accounts: &[Account], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(accounts).context("serialize results")?);
        }
        OutputFormat::JsonPretty => {
            println!(
                "{}",
                serde_json::to_string_pretty(accounts).context("serialize results")?
            );
        }
        OutputFormat::Csv => {
            println!("pk,username,full_name,verified,profile_url");
            for account in accounts {
                println!(
                    "{},{},\"{}\",{},{}",
                    account.pk,
                    account.username,
                    account
                        .full_name
                        .as_deref()
                        .unwrap_or_default()
                        .replace('"', "\"\""),
                    account.is_verified.unwrap_or(false),
                    account.profile_url()
                );
            }
        }
        OutputFormat::Compact => {
            for account in accounts {
                println!("@{} ({})", account.username, account.pk);
            }
        }
        OutputFormat::Text => {
            if accounts.is_empty() {
                println!("{}", "Everyone you follow follows you back.".green());
                return Ok(());
            }

            println!(
                "{} accounts don't follow you back:\n",
                accounts.len().to_string().cyan()
            );
            for (i, account) in accounts.iter().enumerate() {
                print_account(i + 1, account);
            }
        }
    }

    Ok(())
}

fn print_account(num: usize, account: &Account) {
    let verified = if account.is_verified.unwrap_or(false) {
        " ✓".blue().to_string()
    } else {
        String::new()
    };

    println!(
        "{}. @{}{}",
        num.to_string().dimmed(),
        account.username.bold(),
        verified
    );

    if let Some(full_name) = account.full_name.as_deref().filter(|n| !n.is_empty()) {
        println!("   {full_name}");
    }
    println!("   {}", account.profile_url().dimmed());
    println!();
}
